use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::events::PermissionSet;
use crate::state::*;

#[derive(Accounts)]
#[instruction(args: SetPermissionArgs)]
pub struct SetPermission<'info> {
    #[account(mut)]
    pub setter: Signer<'info>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        init_if_needed,
        payer = setter,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, args.caller.as_ref(), args.operation.as_bytes()],
        bump
    )]
    pub condition: Box<Account<'info, PermissionCondition>>,

    /// Event an organizer scopes a purchase condition to
    pub scope_event: Option<Account<'info, EventAccount>>,

    pub system_program: Program<'info, System>,
}

/// Organizers may only write purchase conditions pinned to one of their
/// events, and may not take over an entry pinned to someone else's. Force
/// flags bypass the pin, so they stay with the registry authority.
fn organizer_may_write(
    event: &EventAccount,
    setter: &Pubkey,
    args: &SetPermissionArgs,
    existing: &PermissionCondition,
) -> bool {
    event.organizer == *setter
        && args.operation == OP_PURCHASE_TICKET
        && args.uint_parameter == event.event_id
        && !args.force_allow
        && !args.force_deny
        && (existing.is_vacant() || existing.uint_parameter == event.event_id)
}

/// Create or overwrite the condition for (args.caller, args.operation)
pub fn set_permission(ctx: Context<SetPermission>, args: SetPermissionArgs) -> Result<()> {
    args.validate()?;

    let setter = ctx.accounts.setter.key();
    let authorized = setter == ctx.accounts.registry.authority
        || ctx
            .accounts
            .scope_event
            .as_ref()
            .is_some_and(|event| {
                organizer_may_write(event, &setter, &args, &ctx.accounts.condition)
            });
    require!(authorized, TicketingError::Unauthorized);

    let now = Clock::get()?.unix_timestamp;
    let condition = &mut ctx.accounts.condition;
    condition.apply(&args, now);
    condition.bump = ctx.bumps.condition;

    msg!(
        "Permission {} for {} set by {}",
        args.operation,
        args.caller,
        setter
    );
    emit!(PermissionSet {
        caller: args.caller,
        operation: args.operation,
        active: args.active,
        setter,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EventStatus;

    fn event(organizer: Pubkey) -> EventAccount {
        EventAccount {
            event_id: 5,
            organizer,
            name: "Launch Night".to_string(),
            event_date: 1_900_000_000,
            price_ct: [0; 32],
            total_supply_ct: [0; 32],
            tickets_sold_ct: [0; 32],
            resale_markup_ct: [0; 32],
            secrets_nonce: [0; 16],
            resale_allowed: false,
            status: EventStatus::Active,
            purchase_in_flight: false,
            pending_ticket_id: 0,
            purchase_requested_at: 0,
            created_at: 0,
            bump: 255,
        }
    }

    fn purchase_args(uint_parameter: u64) -> SetPermissionArgs {
        SetPermissionArgs {
            caller: Pubkey::new_unique(),
            operation: OP_PURCHASE_TICKET.to_string(),
            active: true,
            uint_parameter,
            ..Default::default()
        }
    }

    #[test]
    fn test_organizer_scoped_to_own_event() {
        let organizer = Pubkey::new_unique();
        let event = event(organizer);
        let vacant = PermissionCondition::default();

        assert!(organizer_may_write(&event, &organizer, &purchase_args(5), &vacant));
        assert!(!organizer_may_write(&event, &organizer, &purchase_args(6), &vacant));
        assert!(!organizer_may_write(
            &event,
            &Pubkey::new_unique(),
            &purchase_args(5),
            &vacant
        ));

        let mut transfer = purchase_args(5);
        transfer.operation = OP_TRANSFER_TICKET.to_string();
        assert!(!organizer_may_write(&event, &organizer, &transfer, &vacant));
    }

    #[test]
    fn test_organizer_cannot_force_past_event_pin() {
        let organizer = Pubkey::new_unique();
        let event = event(organizer);
        let vacant = PermissionCondition::default();

        let mut allow_everything = purchase_args(5);
        allow_everything.caller = Pubkey::default();
        allow_everything.force_allow = true;
        assert!(!organizer_may_write(&event, &organizer, &allow_everything, &vacant));

        let mut block_user = purchase_args(5);
        block_user.force_deny = true;
        assert!(!organizer_may_write(&event, &organizer, &block_user, &vacant));
    }

    #[test]
    fn test_organizer_cannot_take_over_foreign_entry() {
        let organizer = Pubkey::new_unique();
        let event = event(organizer);
        let foreign = PermissionCondition {
            operation: OP_PURCHASE_TICKET.to_string(),
            uint_parameter: 9,
            ..Default::default()
        };
        assert!(!organizer_may_write(&event, &organizer, &purchase_args(5), &foreign));

        let own = PermissionCondition {
            operation: OP_PURCHASE_TICKET.to_string(),
            uint_parameter: 5,
            ..Default::default()
        };
        assert!(organizer_may_write(&event, &organizer, &purchase_args(5), &own));
    }
}
