//! Program-derived addresses, mirroring the seeds the program checks.

use private_ticketing::constants::*;
use solana_sdk::pubkey::Pubkey;

/// Arcium's seed for per-computation accounts
pub const COMPUTATION_ACCOUNT_SEED: &[u8] = b"ComputationAccount";

pub fn registry(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[REGISTRY_SEED], program_id).0
}

pub fn event(program_id: &Pubkey, event_id: u64) -> Pubkey {
    Pubkey::find_program_address(&[EVENT_SEED, &event_id.to_le_bytes()], program_id).0
}

pub fn ticket(program_id: &Pubkey, ticket_id: u64) -> Pubkey {
    Pubkey::find_program_address(&[TICKET_SEED, &ticket_id.to_le_bytes()], program_id).0
}

pub fn owner_tickets(program_id: &Pubkey, owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[OWNER_TICKETS_SEED, owner.as_ref()], program_id).0
}

/// `caller = Pubkey::default()` addresses the wildcard entry.
pub fn permission(program_id: &Pubkey, caller: &Pubkey, operation: &str) -> Pubkey {
    Pubkey::find_program_address(
        &[PERMISSION_SEED, caller.as_ref(), operation.as_bytes()],
        program_id,
    )
    .0
}

pub fn sign_seed(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[SIGN_SEED], program_id).0
}

pub fn computation_account(arcium_program: &Pubkey, cluster_offset: u32, offset: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[
            COMPUTATION_ACCOUNT_SEED,
            &cluster_offset.to_le_bytes(),
            &offset.to_le_bytes(),
        ],
        arcium_program,
    )
    .0
}
