use anchor_lang::prelude::*;

use crate::errors::TicketingError;

/// Program-wide settings and identifier counters.
#[account]
#[derive(InitSpace)]
pub struct Registry {
    pub authority: Pubkey,
    pub mxe_program_id: Pubkey,
    pub next_event_id: u64,
    pub next_ticket_id: u64,
    pub bump: u8,
}

impl Registry {
    pub fn allocate_event_id(&mut self) -> Result<u64> {
        let id = self.next_event_id;
        self.next_event_id = id.checked_add(1).ok_or(TicketingError::Overflow)?;
        Ok(id)
    }

    pub fn allocate_ticket_id(&mut self) -> Result<u64> {
        let id = self.next_ticket_id;
        self.next_ticket_id = id.checked_add(1).ok_or(TicketingError::Overflow)?;
        Ok(id)
    }

    /// Computations are only queued once an MXE has been configured.
    pub fn require_mxe(&self) -> Result<()> {
        require!(
            self.mxe_program_id != Pubkey::default(),
            TicketingError::MpcUnavailable
        );
        Ok(())
    }
}
