use anchor_lang::prelude::*;

/// What an `EncryptedValueForUser` record carries.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValueKind {
    TicketPrice,
    ResaleQuote,
    SalesCount,
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct EventCreated {
    pub event_id: u64,
    pub organizer: Pubkey,
    pub name: String,
    pub event_date: i64,
    pub resale_allowed: bool,
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct EventActivated {
    pub event_id: u64,
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseRequested {
    pub event_id: u64,
    pub ticket_id: u64,
    pub buyer: Pubkey,
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct TicketPurchased {
    pub event_id: u64,
    pub ticket_id: u64,
    pub buyer: Pubkey,
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseRejected {
    pub event_id: u64,
    pub ticket_id: u64,
    pub buyer: Pubkey,
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct TicketTransferred {
    pub ticket_id: u64,
    pub from: Pubkey,
    pub to: Pubkey,
}

/// Ticket id encrypted for the holder; only they can open it.
#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct OwnershipProof {
    pub ticket_id: u64,
    pub holder: Pubkey,
    pub encrypted_proof: [u8; 32],
    pub nonce: [u8; 16],
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptedValueForUser {
    pub kind: ValueKind,
    pub subject_id: u64,
    pub user: Pubkey,
    pub value: [u8; 32],
    pub nonce: [u8; 16],
}

#[event]
#[derive(Clone, Debug, PartialEq)]
pub struct PermissionSet {
    pub caller: Pubkey,
    pub operation: String,
    pub active: bool,
    pub setter: Pubkey,
}
