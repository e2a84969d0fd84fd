use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::TicketingError;
use crate::events::{PurchaseRejected, PurchaseRequested, TicketPurchased};
use crate::mpc::*;
use crate::state::*;

#[derive(Accounts)]
#[instruction(computation_offset: u64, event_id: u64)]
pub struct PurchaseTicket<'info> {
    #[account(mut)]
    pub buyer: Signer<'info>,

    #[account(mut, seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
        seeds = [EVENT_SEED, event_id.to_le_bytes().as_ref()],
        bump = event.bump
    )]
    pub event: Box<Account<'info, EventAccount>>,

    #[account(
        init,
        payer = buyer,
        space = 8 + Ticket::INIT_SPACE,
        seeds = [TICKET_SEED, registry.next_ticket_id.to_le_bytes().as_ref()],
        bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = 8 + OwnerTickets::INIT_SPACE,
        seeds = [OWNER_TICKETS_SEED, buyer.key().as_ref()],
        bump
    )]
    pub owner_tickets: Box<Account<'info, OwnerTickets>>,

    /// CHECK: buyer's purchase condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, buyer.key().as_ref(), OP_PURCHASE_TICKET.as_bytes()],
        bump
    )]
    pub caller_permission: UncheckedAccount<'info>,

    /// CHECK: wildcard purchase condition, read only if it exists
    #[account(
        seeds = [PERMISSION_SEED, WILDCARD_SEED, OP_PURCHASE_TICKET.as_bytes()],
        bump
    )]
    pub wildcard_permission: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, buyer.key().as_ref(), OP_PROVE_OWNERSHIP.as_bytes()],
        bump
    )]
    pub holder_prove: Box<Account<'info, PermissionCondition>>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, buyer.key().as_ref(), OP_TRANSFER_TICKET.as_bytes()],
        bump
    )]
    pub holder_transfer: Box<Account<'info, PermissionCondition>>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = 8 + PermissionCondition::INIT_SPACE,
        seeds = [PERMISSION_SEED, buyer.key().as_ref(), OP_GET_TICKET_PRICE.as_bytes()],
        bump
    )]
    pub holder_price: Box<Account<'info, PermissionCondition>>,

    pub mxe: MxeQueue<'info>,

    pub system_program: Program<'info, System>,
}

/// Reserve a ticket id and ask the MXE whether the event still has supply.
/// The ticket stays `Pending` until `purchase_ticket_callback` settles it.
pub fn purchase_ticket(
    ctx: Context<PurchaseTicket>,
    computation_offset: u64,
    event_id: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let buyer = ctx.accounts.buyer.key();

    enforce(
        &ctx.accounts.caller_permission.to_account_info(),
        &ctx.accounts.wildcard_permission.to_account_info(),
        now,
        ParamHint::Uint(event_id),
    )?;

    let event = &ctx.accounts.event;
    event.require_active()?;
    require!(
        !event.purchase_in_flight,
        TicketingError::PurchaseInProgress
    );

    let registry = &mut ctx.accounts.registry;
    registry.require_mxe()?;
    let mxe_program_id = registry.mxe_program_id;
    let ticket_id = registry.allocate_ticket_id()?;

    let ticket = &mut ctx.accounts.ticket;
    ticket.ticket_id = ticket_id;
    ticket.event_id = event_id;
    ticket.owner = buyer;
    ticket.price_ct = [0u8; 32];
    ticket.price_nonce = [0u8; 16];
    ticket.status = TicketStatus::Pending;
    ticket.transfer_count = 0;
    ticket.purchased_at = now;
    ticket.bump = ctx.bumps.ticket;

    let owner_tickets = &mut ctx.accounts.owner_tickets;
    if owner_tickets.owner == Pubkey::default() {
        owner_tickets.owner = buyer;
        owner_tickets.bump = ctx.bumps.owner_tickets;
    }
    require!(
        owner_tickets.has_room_for(ticket_id),
        TicketingError::TooManyTickets
    );

    ctx.accounts
        .holder_prove
        .grant_if_vacant(buyer, OP_PROVE_OWNERSHIP, now, ctx.bumps.holder_prove);
    ctx.accounts
        .holder_transfer
        .grant_if_vacant(buyer, OP_TRANSFER_TICKET, now, ctx.bumps.holder_transfer);
    ctx.accounts
        .holder_price
        .grant_if_vacant(buyer, OP_GET_TICKET_PRICE, now, ctx.bumps.holder_price);

    let event = &mut ctx.accounts.event;
    event.begin_purchase(ticket_id, now)?;
    let args = ComputationArgs::new()
        .mxe_owner(event.secrets_nonce)
        .encrypted_fields(&event.secrets());

    ctx.accounts.mxe.queue(
        ctx.accounts.buyer.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        computation_offset,
        PURCHASE_TICKET_COMP,
        args,
        mxe_program_id,
        callback_ix(
            crate::instruction::PurchaseTicketCallback::DISCRIMINATOR,
            &[
                (ctx.accounts.ticket.key(), true),
                (ctx.accounts.event.key(), true),
                (ctx.accounts.owner_tickets.key(), true),
            ],
        ),
    )?;

    emit!(PurchaseRequested {
        event_id,
        ticket_id,
        buyer,
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(ticket_id: u64)]
pub struct PurchaseTicketCallback<'info> {
    #[account(
        mut,
        seeds = [TICKET_SEED, ticket_id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,

    #[account(
        mut,
        seeds = [EVENT_SEED, ticket.event_id.to_le_bytes().as_ref()],
        bump = event.bump
    )]
    pub event: Box<Account<'info, EventAccount>>,

    #[account(
        mut,
        seeds = [OWNER_TICKETS_SEED, ticket.owner.as_ref()],
        bump = owner_tickets.bump
    )]
    pub owner_tickets: Box<Account<'info, OwnerTickets>>,

    /// CHECK: address-constrained to the instructions sysvar
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions_sysvar: AccountInfo<'info>,
}

/// Settlement of one purchase computation. `fresh_secrets` carries the
/// event ciphertexts with the sold counter already advanced by the MXE.
pub struct PurchaseOutcome {
    pub available: bool,
    pub fresh_secrets: ([u8; 128], [u8; 16]),
    pub price: ([u8; 32], [u8; 16]),
}

/// Releases the event's guard and either sells the ticket or rejects it.
/// A buyer whose index filled up while the computation ran is rejected and
/// the sold counter is left untouched. Returns whether the ticket was sold.
pub fn settle_purchase(
    event: &mut EventAccount,
    ticket: &mut Ticket,
    owner_tickets: &mut OwnerTickets,
    outcome: PurchaseOutcome,
) -> Result<bool> {
    require!(
        ticket.status == TicketStatus::Pending,
        TicketingError::PurchaseSettled
    );
    event.end_purchase();

    if !outcome.available || !owner_tickets.has_room_for(ticket.ticket_id) {
        ticket.status = TicketStatus::Rejected;
        return Ok(false);
    }

    let (secrets, secrets_nonce) = outcome.fresh_secrets;
    event.store_secrets(secrets, secrets_nonce);
    ticket.status = TicketStatus::Sold;
    (ticket.price_ct, ticket.price_nonce) = outcome.price;
    owner_tickets.insert(ticket.ticket_id)?;
    Ok(true)
}

/// Callback from Arcium after purchase_ticket completes. `available` is the
/// revealed result of the sold < supply comparison.
pub fn purchase_ticket_callback(
    ctx: Context<PurchaseTicketCallback>,
    ticket_id: u64,
    available: bool,
    secrets: [u8; 128],
    secrets_nonce: [u8; 16],
    price_ct: [u8; 32],
    price_nonce: [u8; 16],
) -> Result<()> {
    require_arcium_caller(&ctx.accounts.instructions_sysvar)?;

    let accounts = &mut ctx.accounts;
    let sold = settle_purchase(
        &mut accounts.event,
        &mut accounts.ticket,
        &mut accounts.owner_tickets,
        PurchaseOutcome {
            available,
            fresh_secrets: (secrets, secrets_nonce),
            price: (price_ct, price_nonce),
        },
    )?;

    let event_id = accounts.event.event_id;
    let buyer = accounts.ticket.owner;
    if sold {
        emit!(TicketPurchased {
            event_id,
            ticket_id,
            buyer,
        });
    } else {
        msg!("Ticket {} for event {} rejected", ticket_id, event_id);
        emit!(PurchaseRejected {
            event_id,
            ticket_id,
            buyer,
        });
    }

    Ok(())
}

#[derive(Accounts)]
#[instruction(event_id: u64)]
pub struct ClearStalePurchase<'info> {
    pub signer: Signer<'info>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
        seeds = [EVENT_SEED, event_id.to_le_bytes().as_ref()],
        bump = event.bump
    )]
    pub event: Box<Account<'info, EventAccount>>,

    #[account(
        mut,
        seeds = [TICKET_SEED, event.pending_ticket_id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Box<Account<'info, Ticket>>,
}

/// Release a purchase guard the cluster never settled, rejecting the
/// ticket that held it. A late callback for that ticket then fails with
/// `PurchaseSettled`.
pub fn clear_stale_purchase(ctx: Context<ClearStalePurchase>, event_id: u64) -> Result<()> {
    let signer = ctx.accounts.signer.key();
    let event = &mut ctx.accounts.event;
    require!(
        signer == event.organizer || signer == ctx.accounts.registry.authority,
        TicketingError::Unauthorized
    );

    let now = Clock::get()?.unix_timestamp;
    require!(
        event.purchase_is_stale(now),
        TicketingError::PurchaseNotStale
    );

    let ticket = &mut ctx.accounts.ticket;
    require!(
        ticket.status == TicketStatus::Pending,
        TicketingError::PurchaseSettled
    );
    ticket.status = TicketStatus::Rejected;
    event.end_purchase();

    msg!("Stale purchase of ticket {} cleared by {}", ticket.ticket_id, signer);
    emit!(PurchaseRejected {
        event_id,
        ticket_id: ticket.ticket_id,
        buyer: ticket.owner,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_in_flight() -> EventAccount {
        let mut event = EventAccount {
            event_id: 2,
            organizer: Pubkey::new_unique(),
            name: "Late Show".to_string(),
            event_date: 1_900_000_000,
            price_ct: [1; 32],
            total_supply_ct: [2; 32],
            tickets_sold_ct: [3; 32],
            resale_markup_ct: [4; 32],
            secrets_nonce: [5; 16],
            resale_allowed: false,
            status: EventStatus::Active,
            purchase_in_flight: false,
            pending_ticket_id: 0,
            purchase_requested_at: 0,
            created_at: 0,
            bump: 255,
        };
        event.begin_purchase(70, 1_000).unwrap();
        event
    }

    fn pending_ticket(owner: Pubkey) -> Ticket {
        Ticket {
            ticket_id: 70,
            event_id: 2,
            owner,
            price_ct: [0; 32],
            price_nonce: [0; 16],
            status: TicketStatus::Pending,
            transfer_count: 0,
            purchased_at: 1_000,
            bump: 254,
        }
    }

    fn index(owner: Pubkey, held: u64) -> OwnerTickets {
        OwnerTickets {
            owner,
            ticket_ids: (1..=held).collect(),
            bump: 253,
        }
    }

    fn outcome(available: bool) -> PurchaseOutcome {
        PurchaseOutcome {
            available,
            fresh_secrets: ([9; 128], [8; 16]),
            price: ([7; 32], [6; 16]),
        }
    }

    #[test]
    fn test_available_purchase_sells_and_indexes() {
        let owner = Pubkey::new_unique();
        let (mut event, mut ticket, mut book) =
            (event_in_flight(), pending_ticket(owner), index(owner, 2));

        assert!(settle_purchase(&mut event, &mut ticket, &mut book, outcome(true)).unwrap());
        assert_eq!(ticket.status, TicketStatus::Sold);
        assert_eq!(ticket.price_ct, [7; 32]);
        assert_eq!(book.ticket_ids, vec![1, 2, 70]);
        assert_eq!(event.tickets_sold_ct, [9; 32]);
        assert!(!event.purchase_in_flight);
    }

    #[test]
    fn test_sold_out_rejects_and_releases_guard() {
        let owner = Pubkey::new_unique();
        let (mut event, mut ticket, mut book) =
            (event_in_flight(), pending_ticket(owner), index(owner, 0));

        assert!(!settle_purchase(&mut event, &mut ticket, &mut book, outcome(false)).unwrap());
        assert_eq!(ticket.status, TicketStatus::Rejected);
        assert!(book.ticket_ids.is_empty());
        assert!(!event.purchase_in_flight);
    }

    #[test]
    fn test_full_index_rejects_without_counting_a_sale() {
        let owner = Pubkey::new_unique();
        let (mut event, mut ticket, mut book) = (
            event_in_flight(),
            pending_ticket(owner),
            index(owner, MAX_TICKETS_PER_OWNER as u64),
        );

        assert!(!settle_purchase(&mut event, &mut ticket, &mut book, outcome(true)).unwrap());
        assert_eq!(ticket.status, TicketStatus::Rejected);
        assert_eq!(book.ticket_ids.len(), MAX_TICKETS_PER_OWNER);
        // sold counter keeps its pre-purchase ciphertext
        assert_eq!(event.tickets_sold_ct, [3; 32]);
        assert!(!event.purchase_in_flight);
        assert!(event.begin_purchase(71, 1_001).is_ok());
    }

    #[test]
    fn test_settled_ticket_cannot_settle_twice() {
        let owner = Pubkey::new_unique();
        let (mut event, mut ticket, mut book) =
            (event_in_flight(), pending_ticket(owner), index(owner, 0));
        settle_purchase(&mut event, &mut ticket, &mut book, outcome(false)).unwrap();

        event.begin_purchase(71, 1_001).unwrap();
        assert!(settle_purchase(&mut event, &mut ticket, &mut book, outcome(true)).is_err());
        // the guard of the newer purchase is untouched
        assert!(event.purchase_in_flight);
    }
}
