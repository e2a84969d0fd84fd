//! Permission table: one condition per (caller, operation).
//!
//! A condition stored under the default pubkey is the wildcard entry for its
//! operation and applies to every caller without an entry of their own.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;

#[account]
#[derive(InitSpace, Default, Debug)]
pub struct PermissionCondition {
    /// `Pubkey::default()` for the wildcard entry
    pub caller: Pubkey,
    #[max_len(32)]
    pub operation: String,
    pub active: bool,
    /// Earliest allowed unix timestamp, 0 = unbounded
    pub valid_from: i64,
    /// Latest allowed unix timestamp, 0 = unbounded
    pub valid_until: i64,
    pub force_allow: bool,
    pub force_deny: bool,
    /// 0 = no constraint
    pub uint_parameter: u64,
    /// Default key = no constraint
    pub address_parameter: Pubkey,
    /// Empty = no constraint
    #[max_len(64)]
    pub string_parameter: String,
    pub updated_at: i64,
    pub bump: u8,
}

/// The value a gated call presents to the condition's parameter constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamHint<'a> {
    None,
    Uint(u64),
    Address(Pubkey),
    Text(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(&'static str),
}

impl PermissionCondition {
    /// Caller-supplied fields of a condition; identity and bump are set by
    /// the instruction.
    pub fn apply(&mut self, args: &SetPermissionArgs, now: i64) {
        self.caller = args.caller;
        self.operation = args.operation.clone();
        self.active = args.active;
        self.valid_from = args.valid_from;
        self.valid_until = args.valid_until;
        self.force_allow = args.force_allow;
        self.force_deny = args.force_deny;
        self.uint_parameter = args.uint_parameter;
        self.address_parameter = args.address_parameter;
        self.string_parameter = args.string_parameter.clone();
        self.updated_at = now;
    }

    /// A freshly allocated (zeroed) account has no operation name yet.
    pub fn is_vacant(&self) -> bool {
        self.operation.is_empty()
    }

    /// Unconstrained, active entry for a new ticket holder.
    pub fn grant_holder(&mut self, holder: Pubkey, operation: &str, now: i64, bump: u8) {
        self.caller = holder;
        self.operation = operation.to_string();
        self.active = true;
        self.valid_from = 0;
        self.valid_until = 0;
        self.force_allow = false;
        self.force_deny = false;
        self.uint_parameter = 0;
        self.address_parameter = Pubkey::default();
        self.string_parameter = String::new();
        self.updated_at = now;
        self.bump = bump;
    }

    /// Grants `operation` to `holder` unless an entry already exists.
    pub fn grant_if_vacant(&mut self, holder: Pubkey, operation: &str, now: i64, bump: u8) -> bool {
        if !self.is_vacant() {
            return false;
        }
        self.grant_holder(holder, operation, now, bump);
        true
    }

    pub fn within_window(&self, now: i64) -> bool {
        (self.valid_from == 0 || now >= self.valid_from)
            && (self.valid_until == 0 || now <= self.valid_until)
    }

    pub fn evaluate(&self, now: i64, hint: ParamHint) -> Verdict {
        if self.force_deny {
            return Verdict::Deny("forced deny");
        }
        if self.force_allow {
            return Verdict::Allow;
        }
        if !self.within_window(now) {
            return Verdict::Deny("outside validity window");
        }
        if !self.active {
            return Verdict::Deny("inactive");
        }
        if self.uint_parameter != 0 && hint != ParamHint::Uint(self.uint_parameter) {
            return Verdict::Deny("uint parameter mismatch");
        }
        if self.address_parameter != Pubkey::default()
            && hint != ParamHint::Address(self.address_parameter)
        {
            return Verdict::Deny("address parameter mismatch");
        }
        if !self.string_parameter.is_empty()
            && hint != ParamHint::Text(self.string_parameter.as_str())
        {
            return Verdict::Deny("string parameter mismatch");
        }
        Verdict::Allow
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct SetPermissionArgs {
    pub caller: Pubkey,
    pub operation: String,
    pub active: bool,
    pub valid_from: i64,
    pub valid_until: i64,
    pub force_allow: bool,
    pub force_deny: bool,
    pub uint_parameter: u64,
    pub address_parameter: Pubkey,
    pub string_parameter: String,
}

impl SetPermissionArgs {
    pub fn validate(&self) -> Result<()> {
        require!(
            KNOWN_OPERATIONS.contains(&self.operation.as_str()),
            TicketingError::UnknownOperation
        );
        require!(
            self.string_parameter.len() <= MAX_STRING_PARAMETER_LEN,
            TicketingError::ParameterTooLong
        );
        if self.valid_from != 0 && self.valid_until != 0 {
            require!(
                self.valid_from <= self.valid_until,
                TicketingError::InvalidWindow
            );
        }
        Ok(())
    }
}

/// Reads a condition PDA that may not have been created yet.
pub fn load_condition(info: &AccountInfo) -> Result<Option<PermissionCondition>> {
    if info.owner != &crate::ID || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let condition = PermissionCondition::try_deserialize(&mut &data[..])?;
    Ok(Some(condition))
}

/// The caller's own entry decides if present, the wildcard otherwise; with
/// neither the call is denied.
pub fn check_permission(
    caller_condition: Option<&PermissionCondition>,
    wildcard_condition: Option<&PermissionCondition>,
    now: i64,
    hint: ParamHint,
) -> Result<()> {
    let verdict = match caller_condition.or(wildcard_condition) {
        Some(condition) => condition.evaluate(now, hint),
        None => Verdict::Deny("no condition"),
    };
    match verdict {
        Verdict::Allow => Ok(()),
        Verdict::Deny(reason) => {
            msg!("Permission denied: {}", reason);
            err!(TicketingError::PermissionDenied)
        }
    }
}

/// Gate for an instruction whose accounts carry both condition PDAs.
pub fn enforce(
    caller_info: &AccountInfo,
    wildcard_info: &AccountInfo,
    now: i64,
    hint: ParamHint,
) -> Result<()> {
    let caller_condition = load_condition(caller_info)?;
    let wildcard_condition = load_condition(wildcard_info)?;
    check_permission(
        caller_condition.as_ref(),
        wildcard_condition.as_ref(),
        now,
        hint,
    )
}
