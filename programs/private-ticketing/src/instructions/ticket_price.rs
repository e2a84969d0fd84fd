use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::mpc::*;
use crate::state::*;

#[derive(Accounts)]
#[instruction(computation_offset: u64, ticket_id: u64)]
pub struct GetTicketPrice<'info> {
    #[account(mut)]
    pub holder: Signer<'info>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        seeds = [TICKET_SEED, ticket_id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,

    /// CHECK: holder's price condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, holder.key().as_ref(), OP_GET_TICKET_PRICE.as_bytes()],
        bump
    )]
    pub caller_permission: UncheckedAccount<'info>,

    /// CHECK: wildcard price condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, WILDCARD_SEED, OP_GET_TICKET_PRICE.as_bytes()],
        bump
    )]
    pub wildcard_permission: UncheckedAccount<'info>,

    pub mxe: MxeQueue<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> GetTicketPrice<'info> {
    fn authorize(&self, ticket_id: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        enforce(
            &self.caller_permission.to_account_info(),
            &self.wildcard_permission.to_account_info(),
            now,
            ParamHint::Uint(ticket_id),
        )?;
        self.ticket.require_held_by(&self.holder.key())?;
        self.registry.require_mxe()
    }
}

/// Re-encrypt the price paid for a ticket for its holder
pub fn get_my_ticket_price(
    ctx: Context<GetTicketPrice>,
    computation_offset: u64,
    ticket_id: u64,
    enc_pubkey: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    let accounts = &ctx.accounts;
    accounts.authorize(ticket_id)?;

    let args = ComputationArgs::new()
        .shared_owner(enc_pubkey, nonce)
        .mxe_owner(accounts.ticket.price_nonce)
        .encrypted_u64(accounts.ticket.price_ct)
        .plaintext_u64(ticket_id);

    accounts.mxe.queue(
        accounts.holder.to_account_info(),
        accounts.system_program.to_account_info(),
        computation_offset,
        REVEAL_TICKET_PRICE_COMP,
        args,
        accounts.registry.mxe_program_id,
        callback_ix(crate::instruction::DeliverValueCallback::DISCRIMINATOR, &[]),
    )
}

#[derive(Accounts)]
#[instruction(computation_offset: u64, ticket_id: u64)]
pub struct QuoteResalePrice<'info> {
    pub price: GetTicketPrice<'info>,

    #[account(
        seeds = [EVENT_SEED, price.ticket.event_id.to_le_bytes().as_ref()],
        bump = event.bump
    )]
    pub event: Box<Account<'info, EventAccount>>,
}

/// Quote the highest resale price the event allows for this ticket:
/// purchase price marked up by the organizer's encrypted percentage.
pub fn quote_resale_price(
    ctx: Context<QuoteResalePrice>,
    computation_offset: u64,
    ticket_id: u64,
    enc_pubkey: [u8; 32],
    nonce: [u8; 16],
) -> Result<()> {
    let price = &ctx.accounts.price;
    price.authorize(ticket_id)?;

    let event = &ctx.accounts.event;
    require!(event.resale_allowed, TicketingError::ResaleNotAllowed);

    let args = ComputationArgs::new()
        .shared_owner(enc_pubkey, nonce)
        .mxe_owner(price.ticket.price_nonce)
        .encrypted_u64(price.ticket.price_ct)
        .mxe_owner(event.secrets_nonce)
        .encrypted_fields(&event.secrets())
        .plaintext_u64(ticket_id);

    price.mxe.queue(
        price.holder.to_account_info(),
        price.system_program.to_account_info(),
        computation_offset,
        QUOTE_RESALE_COMP,
        args,
        price.registry.mxe_program_id,
        callback_ix(crate::instruction::DeliverValueCallback::DISCRIMINATOR, &[]),
    )
}
