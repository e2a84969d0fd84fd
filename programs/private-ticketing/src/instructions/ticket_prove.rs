use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::events::OwnershipProof;
use crate::mpc::*;
use crate::state::*;

#[derive(Accounts)]
#[instruction(computation_offset: u64, ticket_id: u64)]
pub struct ProveOwnership<'info> {
    #[account(mut)]
    pub holder: Signer<'info>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        seeds = [TICKET_SEED, ticket_id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,

    /// CHECK: holder's prove condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, holder.key().as_ref(), OP_PROVE_OWNERSHIP.as_bytes()],
        bump
    )]
    pub caller_permission: UncheckedAccount<'info>,

    /// CHECK: wildcard prove condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, WILDCARD_SEED, OP_PROVE_OWNERSHIP.as_bytes()],
        bump
    )]
    pub wildcard_permission: UncheckedAccount<'info>,

    pub mxe: MxeQueue<'info>,

    pub system_program: Program<'info, System>,
}

/// Ask the MXE to encrypt the ticket id for the holder's key. Only the
/// holder can open the resulting `OwnershipProof`.
pub fn prove_ownership(
    ctx: Context<ProveOwnership>,
    computation_offset: u64,
    ticket_id: u64,
    enc_pubkey: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    enforce(
        &ctx.accounts.caller_permission.to_account_info(),
        &ctx.accounts.wildcard_permission.to_account_info(),
        now,
        ParamHint::Uint(ticket_id),
    )?;
    ctx.accounts.ticket.require_held_by(&ctx.accounts.holder.key())?;

    let registry = &ctx.accounts.registry;
    registry.require_mxe()?;

    let args = ComputationArgs::new()
        .shared_owner(enc_pubkey, nonce)
        .plaintext_u64(ticket_id);

    ctx.accounts.mxe.queue(
        ctx.accounts.holder.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        computation_offset,
        PROVE_OWNERSHIP_COMP,
        args,
        registry.mxe_program_id,
        callback_ix(
            crate::instruction::ProveOwnershipCallback::DISCRIMINATOR,
            &[(ctx.accounts.ticket.key(), false)],
        ),
    )
}

#[derive(Accounts)]
#[instruction(ticket_id: u64)]
pub struct ProveOwnershipCallback<'info> {
    #[account(
        seeds = [TICKET_SEED, ticket_id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,

    /// CHECK: address-constrained to the instructions sysvar
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions_sysvar: AccountInfo<'info>,
}

/// Callback from Arcium after prove_ownership completes
pub fn prove_ownership_callback(
    ctx: Context<ProveOwnershipCallback>,
    ticket_id: u64,
    holder: Pubkey,
    encrypted_proof: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    require_arcium_caller(&ctx.accounts.instructions_sysvar)?;
    // the ticket may have moved while the computation was queued
    require_keys_eq!(ctx.accounts.ticket.owner, holder, TicketingError::NotOwner);

    emit!(OwnershipProof {
        ticket_id,
        holder,
        encrypted_proof,
        nonce,
    });
    Ok(())
}
