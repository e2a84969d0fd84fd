use anchor_lang::prelude::*;

use crate::events::{EncryptedValueForUser, ValueKind};
use crate::mpc::require_arcium_caller;

#[derive(Accounts)]
pub struct DeliverValueCallback<'info> {
    /// CHECK: address-constrained to the instructions sysvar
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions_sysvar: AccountInfo<'info>,
}

/// Shared callback of reveal_ticket_price, quote_resale and reveal_sales:
/// the value is already encrypted for `user`, the program only logs it.
pub fn deliver_value_callback(
    ctx: Context<DeliverValueCallback>,
    kind: ValueKind,
    subject_id: u64,
    user: Pubkey,
    value: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    require_arcium_caller(&ctx.accounts.instructions_sysvar)?;

    emit!(EncryptedValueForUser {
        kind,
        subject_id,
        user,
        value,
        nonce,
    });
    Ok(())
}
