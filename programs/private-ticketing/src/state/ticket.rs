use anchor_lang::prelude::*;

use crate::errors::TicketingError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum TicketStatus {
    /// Purchase computation queued
    Pending,
    Sold,
    /// The MXE found the event sold out
    Rejected,
}

#[account]
#[derive(InitSpace)]
pub struct Ticket {
    pub ticket_id: u64,
    pub event_id: u64,
    pub owner: Pubkey,
    /// Event price at purchase time, encrypted to the MXE
    pub price_ct: [u8; 32],
    pub price_nonce: [u8; 16],
    pub status: TicketStatus,
    pub transfer_count: u32,
    pub purchased_at: i64,
    pub bump: u8,
}

impl Ticket {
    pub fn require_held_by(&self, holder: &Pubkey) -> Result<()> {
        require!(self.status == TicketStatus::Sold, TicketingError::TicketNotSold);
        require_keys_eq!(self.owner, *holder, TicketingError::NotOwner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_sold_tickets_are_held() {
        let owner = Pubkey::new_unique();
        let mut ticket = Ticket {
            ticket_id: 1,
            event_id: 1,
            owner,
            price_ct: [0; 32],
            price_nonce: [0; 16],
            status: TicketStatus::Pending,
            transfer_count: 0,
            purchased_at: 0,
            bump: 255,
        };

        assert!(ticket.require_held_by(&owner).is_err());
        ticket.status = TicketStatus::Sold;
        assert!(ticket.require_held_by(&owner).is_ok());
        assert!(ticket.require_held_by(&Pubkey::new_unique()).is_err());
    }
}
