use anchor_lang::prelude::*;

use crate::constants::MAX_TICKETS_PER_OWNER;
use crate::errors::TicketingError;

/// Ticket ids currently held by one owner, oldest first.
#[account]
#[derive(InitSpace)]
pub struct OwnerTickets {
    pub owner: Pubkey,
    #[max_len(64)]
    pub ticket_ids: Vec<u64>,
    pub bump: u8,
}

impl OwnerTickets {
    pub fn contains(&self, ticket_id: u64) -> bool {
        self.ticket_ids.contains(&ticket_id)
    }

    /// Whether `ticket_id` could be inserted without hitting the cap.
    pub fn has_room_for(&self, ticket_id: u64) -> bool {
        self.contains(ticket_id) || self.ticket_ids.len() < MAX_TICKETS_PER_OWNER
    }

    /// Adding an id that is already present is a no-op.
    pub fn insert(&mut self, ticket_id: u64) -> Result<()> {
        if self.contains(ticket_id) {
            return Ok(());
        }
        require!(self.has_room_for(ticket_id), TicketingError::TooManyTickets);
        self.ticket_ids.push(ticket_id);
        Ok(())
    }

    pub fn remove(&mut self, ticket_id: u64) -> bool {
        let before = self.ticket_ids.len();
        self.ticket_ids.retain(|id| *id != ticket_id);
        self.ticket_ids.len() != before
    }
}
