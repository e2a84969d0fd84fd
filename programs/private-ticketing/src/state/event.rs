use anchor_lang::prelude::*;

use crate::constants::{EVENT_SECRET_FIELDS, PURCHASE_TIMEOUT_SECS};
use crate::errors::TicketingError;
use crate::mpc::{join_ciphertexts, split_ciphertext_128};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum EventStatus {
    /// Created, waiting for the MXE to validate and re-encrypt the inputs
    Pending,
    /// Ciphertexts are in place; tickets can be bought
    Active,
}

#[account]
#[derive(InitSpace)]
pub struct EventAccount {
    pub event_id: u64,
    pub organizer: Pubkey,
    #[max_len(64)]
    pub name: String,
    pub event_date: i64,
    pub price_ct: [u8; 32],
    pub total_supply_ct: [u8; 32],
    pub tickets_sold_ct: [u8; 32],
    pub resale_markup_ct: [u8; 32],
    /// Nonce shared by the four ciphertexts above
    pub secrets_nonce: [u8; 16],
    pub resale_allowed: bool,
    pub status: EventStatus,
    /// Set while a purchase computation reads the sold counter
    pub purchase_in_flight: bool,
    /// Ticket and time of the purchase holding the guard
    pub pending_ticket_id: u64,
    pub purchase_requested_at: i64,
    pub created_at: i64,
    pub bump: u8,
}

impl EventAccount {
    pub fn require_active(&self) -> Result<()> {
        require!(
            self.status == EventStatus::Active,
            TicketingError::EventNotActive
        );
        Ok(())
    }

    pub fn begin_purchase(&mut self, ticket_id: u64, now: i64) -> Result<()> {
        require!(!self.purchase_in_flight, TicketingError::PurchaseInProgress);
        self.purchase_in_flight = true;
        self.pending_ticket_id = ticket_id;
        self.purchase_requested_at = now;
        Ok(())
    }

    pub fn end_purchase(&mut self) {
        self.purchase_in_flight = false;
        self.pending_ticket_id = 0;
        self.purchase_requested_at = 0;
    }

    /// The guard is held by a purchase the cluster never settled.
    pub fn purchase_is_stale(&self, now: i64) -> bool {
        self.purchase_in_flight
            && now.saturating_sub(self.purchase_requested_at) >= PURCHASE_TIMEOUT_SECS
    }

    /// Ciphertexts in the field order of the circuit's `EventBook`.
    pub fn secrets(&self) -> [[u8; 32]; EVENT_SECRET_FIELDS] {
        [
            self.price_ct,
            self.total_supply_ct,
            self.tickets_sold_ct,
            self.resale_markup_ct,
        ]
    }

    pub fn packed_secrets(&self) -> [u8; 128] {
        join_ciphertexts(self.secrets())
    }

    pub fn store_secrets(&mut self, packed: [u8; 128], nonce: [u8; 16]) {
        let [price, supply, sold, markup] = split_ciphertext_128(packed);
        self.price_ct = price;
        self.total_supply_ct = supply;
        self.tickets_sold_ct = sold;
        self.resale_markup_ct = markup;
        self.secrets_nonce = nonce;
    }
}
