use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::events::{EventActivated, EventCreated};
use crate::mpc::*;
use crate::state::{EventAccount, EventStatus, Registry};

#[derive(Accounts)]
pub struct CreateEvent<'info> {
    #[account(mut)]
    pub organizer: Signer<'info>,

    #[account(mut, seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        init,
        payer = organizer,
        space = 8 + EventAccount::INIT_SPACE,
        seeds = [EVENT_SEED, registry.next_event_id.to_le_bytes().as_ref()],
        bump
    )]
    pub event: Box<Account<'info, EventAccount>>,

    pub mxe: MxeQueue<'info>,

    pub system_program: Program<'info, System>,
}

/// Create an event whose price, supply and resale markup arrive encrypted
/// by the organizer. The event stays `Pending` until the MXE has validated
/// the ciphertexts and re-encrypted them for itself.
#[allow(clippy::too_many_arguments)]
pub fn create_event(
    ctx: Context<CreateEvent>,
    computation_offset: u64,
    name: String,
    event_date: i64,
    price_ct: [u8; 32],
    supply_ct: [u8; 32],
    resale_allowed: bool,
    markup_ct: [u8; 32],
    enc_pubkey: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    require!(!name.is_empty(), TicketingError::EventNameEmpty);
    require!(
        name.len() <= MAX_EVENT_NAME_LEN,
        TicketingError::EventNameTooLong
    );

    let clock = Clock::get()?;
    require!(
        event_date > clock.unix_timestamp,
        TicketingError::EventDateInPast
    );

    let registry = &mut ctx.accounts.registry;
    registry.require_mxe()?;
    let mxe_program_id = registry.mxe_program_id;
    let event_id = registry.allocate_event_id()?;

    let event = &mut ctx.accounts.event;
    event.event_id = event_id;
    event.organizer = ctx.accounts.organizer.key();
    event.name = name.clone();
    event.event_date = event_date;
    event.store_secrets([0u8; 128], [0u8; 16]);
    event.resale_allowed = resale_allowed;
    event.status = EventStatus::Pending;
    event.end_purchase();
    event.created_at = clock.unix_timestamp;
    event.bump = ctx.bumps.event;

    let args = ComputationArgs::new()
        .shared_owner(enc_pubkey, nonce)
        .encrypted_fields(&[price_ct, supply_ct, markup_ct]);

    ctx.accounts.mxe.queue(
        ctx.accounts.organizer.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        computation_offset,
        INIT_EVENT_COMP,
        args,
        mxe_program_id,
        callback_ix(
            crate::instruction::InitEventCallback::DISCRIMINATOR,
            &[(ctx.accounts.event.key(), true)],
        ),
    )?;

    emit!(EventCreated {
        event_id,
        organizer: ctx.accounts.organizer.key(),
        name,
        event_date,
        resale_allowed,
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(event_id: u64)]
pub struct InitEventCallback<'info> {
    #[account(
        mut,
        seeds = [EVENT_SEED, event_id.to_le_bytes().as_ref()],
        bump = event.bump
    )]
    pub event: Box<Account<'info, EventAccount>>,

    /// CHECK: address-constrained to the instructions sysvar
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions_sysvar: AccountInfo<'info>,
}

/// Callback from Arcium after init_event completes
pub fn init_event_callback(
    ctx: Context<InitEventCallback>,
    event_id: u64,
    secrets: [u8; 128],
    nonce: [u8; 16],
) -> Result<()> {
    require_arcium_caller(&ctx.accounts.instructions_sysvar)?;

    let event = &mut ctx.accounts.event;
    require!(
        event.status == EventStatus::Pending,
        TicketingError::EventAlreadyActive
    );
    event.store_secrets(secrets, nonce);
    event.status = EventStatus::Active;

    emit!(EventActivated { event_id });
    Ok(())
}
