use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::events::TicketTransferred;
use crate::state::*;

#[derive(Accounts)]
#[instruction(ticket_id: u64, to: Pubkey)]
pub struct TransferTicket<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [TICKET_SEED, ticket_id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,

    #[account(
        mut,
        seeds = [OWNER_TICKETS_SEED, owner.key().as_ref()],
        bump = from_tickets.bump
    )]
    pub from_tickets: Box<Account<'info, OwnerTickets>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + OwnerTickets::INIT_SPACE,
        seeds = [OWNER_TICKETS_SEED, to.as_ref()],
        bump
    )]
    pub to_tickets: Box<Account<'info, OwnerTickets>>,

    /// CHECK: owner's transfer condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, owner.key().as_ref(), OP_TRANSFER_TICKET.as_bytes()],
        bump
    )]
    pub caller_permission: UncheckedAccount<'info>,

    /// CHECK: wildcard transfer condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, WILDCARD_SEED, OP_TRANSFER_TICKET.as_bytes()],
        bump
    )]
    pub wildcard_permission: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, to.as_ref(), OP_PROVE_OWNERSHIP.as_bytes()],
        bump
    )]
    pub recipient_prove: Box<Account<'info, PermissionCondition>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, to.as_ref(), OP_TRANSFER_TICKET.as_bytes()],
        bump
    )]
    pub recipient_transfer: Box<Account<'info, PermissionCondition>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, to.as_ref(), OP_GET_TICKET_PRICE.as_bytes()],
        bump
    )]
    pub recipient_price: Box<Account<'info, PermissionCondition>>,

    pub system_program: Program<'info, System>,
}

pub fn transfer_ticket(ctx: Context<TransferTicket>, ticket_id: u64, to: Pubkey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let from = ctx.accounts.owner.key();

    enforce(
        &ctx.accounts.caller_permission.to_account_info(),
        &ctx.accounts.wildcard_permission.to_account_info(),
        now,
        ParamHint::Uint(ticket_id),
    )?;

    let ticket = &mut ctx.accounts.ticket;
    ticket.require_held_by(&from)?;
    require!(
        to != Pubkey::default() && to != from,
        TicketingError::InvalidRecipient
    );

    ctx.accounts.from_tickets.remove(ticket_id);

    let to_tickets = &mut ctx.accounts.to_tickets;
    if to_tickets.owner == Pubkey::default() {
        to_tickets.owner = to;
        to_tickets.bump = ctx.bumps.to_tickets;
    }
    to_tickets.insert(ticket_id)?;

    ticket.owner = to;
    ticket.transfer_count = ticket
        .transfer_count
        .checked_add(1)
        .ok_or(TicketingError::Overflow)?;

    ctx.accounts
        .recipient_prove
        .grant_if_vacant(to, OP_PROVE_OWNERSHIP, now, ctx.bumps.recipient_prove);
    ctx.accounts
        .recipient_transfer
        .grant_if_vacant(to, OP_TRANSFER_TICKET, now, ctx.bumps.recipient_transfer);
    ctx.accounts
        .recipient_price
        .grant_if_vacant(to, OP_GET_TICKET_PRICE, now, ctx.bumps.recipient_price);

    emit!(TicketTransferred { ticket_id, from, to });
    Ok(())
}
