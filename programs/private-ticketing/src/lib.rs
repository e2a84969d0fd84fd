//! Private Event Ticketing - Solana Anchor Program
//!
//! Event price, supply, sold count and resale markup live on-chain only as
//! MXE ciphertexts; all arithmetic on them is queued to an Arcium cluster
//! and comes back through the callback instructions. A permission table
//! gates who may purchase, prove, transfer or query tickets.

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod mpc;
pub mod state;

use events::ValueKind;
use instructions::*;
use state::SetPermissionArgs;

declare_id!("EEfYr4uH5GwBVXqyt3GawdeE6Srx52moucWrexxKfw1h");

/// Pubkey-only forms of account groups nested in several instructions, for
/// off-chain instruction builders.
pub mod composite_accounts {
    pub use crate::mpc::__client_accounts_mxe_queue::MxeQueue;
}

#[program]
pub mod private_ticketing {
    use super::*;

    /// One-time setup of the registry and its id counters
    pub fn initialize(ctx: Context<Initialize>, mxe_program_id: Pubkey) -> Result<()> {
        instructions::initialize(ctx, mxe_program_id)
    }

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
        instructions::create_event(
            ctx,
            computation_offset,
            name,
            event_date,
            price_ct,
            supply_ct,
            resale_allowed,
            markup_ct,
            enc_pubkey,
            nonce,
        )
    }

    pub fn init_event_callback(
        ctx: Context<InitEventCallback>,
        event_id: u64,
        secrets: [u8; 128],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::init_event_callback(ctx, event_id, secrets, nonce)
    }

    pub fn purchase_ticket(
        ctx: Context<PurchaseTicket>,
        computation_offset: u64,
        event_id: u64,
    ) -> Result<()> {
        instructions::purchase_ticket(ctx, computation_offset, event_id)
    }

    pub fn purchase_ticket_callback(
        ctx: Context<PurchaseTicketCallback>,
        ticket_id: u64,
        available: bool,
        secrets: [u8; 128],
        secrets_nonce: [u8; 16],
        price_ct: [u8; 32],
        price_nonce: [u8; 16],
    ) -> Result<()> {
        instructions::purchase_ticket_callback(
            ctx,
            ticket_id,
            available,
            secrets,
            secrets_nonce,
            price_ct,
            price_nonce,
        )
    }

    /// Release an event whose purchase computation never came back
    pub fn clear_stale_purchase(ctx: Context<ClearStalePurchase>, event_id: u64) -> Result<()> {
        instructions::clear_stale_purchase(ctx, event_id)
    }

    pub fn transfer_ticket(ctx: Context<TransferTicket>, ticket_id: u64, to: Pubkey) -> Result<()> {
        instructions::transfer_ticket(ctx, ticket_id, to)
    }

    pub fn prove_ownership(
        ctx: Context<ProveOwnership>,
        computation_offset: u64,
        ticket_id: u64,
        enc_pubkey: [u8; 32],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::prove_ownership(ctx, computation_offset, ticket_id, enc_pubkey, nonce)
    }

    pub fn prove_ownership_callback(
        ctx: Context<ProveOwnershipCallback>,
        ticket_id: u64,
        holder: Pubkey,
        encrypted_proof: [u8; 32],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::prove_ownership_callback(ctx, ticket_id, holder, encrypted_proof, nonce)
    }

    pub fn get_my_ticket_ids(ctx: Context<GetMyTicketIds>) -> Result<Vec<u64>> {
        instructions::get_my_ticket_ids(ctx)
    }

    pub fn get_my_ticket_price(
        ctx: Context<GetTicketPrice>,
        computation_offset: u64,
        ticket_id: u64,
        enc_pubkey: [u8; 32],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::get_my_ticket_price(ctx, computation_offset, ticket_id, enc_pubkey, nonce)
    }

    pub fn quote_resale_price(
        ctx: Context<QuoteResalePrice>,
        computation_offset: u64,
        ticket_id: u64,
        enc_pubkey: [u8; 32],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::quote_resale_price(ctx, computation_offset, ticket_id, enc_pubkey, nonce)
    }

    pub fn get_sales_count(
        ctx: Context<GetSalesCount>,
        computation_offset: u64,
        event_id: u64,
        enc_pubkey: [u8; 32],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::get_sales_count(ctx, computation_offset, event_id, enc_pubkey, nonce)
    }

    /// Callback of every computation that re-encrypts a value for a user
    pub fn deliver_value_callback(
        ctx: Context<DeliverValueCallback>,
        kind: ValueKind,
        subject_id: u64,
        user: Pubkey,
        value: [u8; 32],
        nonce: [u8; 16],
    ) -> Result<()> {
        instructions::deliver_value_callback(ctx, kind, subject_id, user, value, nonce)
    }

    pub fn set_permission(ctx: Context<SetPermission>, args: SetPermissionArgs) -> Result<()> {
        instructions::set_permission(ctx, args)
    }
}
