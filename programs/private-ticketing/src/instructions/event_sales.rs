use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::mpc::*;
use crate::state::{EventAccount, Registry};

#[derive(Accounts)]
#[instruction(computation_offset: u64, event_id: u64)]
pub struct GetSalesCount<'info> {
    #[account(mut)]
    pub organizer: Signer<'info>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        seeds = [EVENT_SEED, event_id.to_le_bytes().as_ref()],
        bump = event.bump,
        has_one = organizer @ TicketingError::NotOrganizer
    )]
    pub event: Box<Account<'info, EventAccount>>,

    pub mxe: MxeQueue<'info>,

    pub system_program: Program<'info, System>,
}

/// Re-encrypt the sold counter for the organizer. The result arrives as an
/// `EncryptedValueForUser` record of kind `SalesCount`.
pub fn get_sales_count(
    ctx: Context<GetSalesCount>,
    computation_offset: u64,
    event_id: u64,
    enc_pubkey: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    let registry = &ctx.accounts.registry;
    registry.require_mxe()?;

    let event = &ctx.accounts.event;
    event.require_active()?;

    let args = ComputationArgs::new()
        .shared_owner(enc_pubkey, nonce)
        .mxe_owner(event.secrets_nonce)
        .encrypted_fields(&event.secrets())
        .plaintext_u64(event_id);

    ctx.accounts.mxe.queue(
        ctx.accounts.organizer.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        computation_offset,
        REVEAL_SALES_COMP,
        args,
        registry.mxe_program_id,
        callback_ix(crate::instruction::DeliverValueCallback::DISCRIMINATOR, &[]),
    )?;

    msg!("Sales count requested for event {}", event_id);
    Ok(())
}
