// ==================== SEEDS ====================

pub const REGISTRY_SEED: &[u8] = b"registry";
pub const EVENT_SEED: &[u8] = b"event";
pub const TICKET_SEED: &[u8] = b"ticket";
pub const OWNER_TICKETS_SEED: &[u8] = b"owner_tickets";
pub const PERMISSION_SEED: &[u8] = b"permission";
pub const SIGN_SEED: &[u8] = b"sign";

/// Caller seed of the wildcard permission entries (`Pubkey::default()`)
pub const WILDCARD_SEED: &[u8] = &[0u8; 32];

// ==================== COMPUTATIONS ====================

/// Computation definition names (must match the ticketing circuit)
pub const INIT_EVENT_COMP: &str = "init_event";
pub const PURCHASE_TICKET_COMP: &str = "purchase_ticket";
pub const PROVE_OWNERSHIP_COMP: &str = "prove_ownership";
pub const REVEAL_TICKET_PRICE_COMP: &str = "reveal_ticket_price";
pub const QUOTE_RESALE_COMP: &str = "quote_resale";
pub const REVEAL_SALES_COMP: &str = "reveal_sales";

// ==================== OPERATIONS ====================

pub const OP_PURCHASE_TICKET: &str = "op_purchase_ticket";
pub const OP_PROVE_OWNERSHIP: &str = "op_prove_ownership";
pub const OP_TRANSFER_TICKET: &str = "op_transfer_ticket";
pub const OP_GET_TICKET_PRICE: &str = "op_get_ticket_price";

pub const KNOWN_OPERATIONS: [&str; 4] = [
    OP_PURCHASE_TICKET,
    OP_PROVE_OWNERSHIP,
    OP_TRANSFER_TICKET,
    OP_GET_TICKET_PRICE,
];

/// Granted to whoever receives a ticket, unless they already hold a condition.
pub const HOLDER_OPERATIONS: [&str; 3] = [
    OP_PROVE_OWNERSHIP,
    OP_TRANSFER_TICKET,
    OP_GET_TICKET_PRICE,
];

// ==================== LIMITS ====================

pub const MAX_EVENT_NAME_LEN: usize = 64;
pub const MAX_STRING_PARAMETER_LEN: usize = 64;
pub const MAX_TICKETS_PER_OWNER: usize = 64;

/// A purchase still unsettled after this long may be cleared by the
/// organizer or the registry authority.
pub const PURCHASE_TIMEOUT_SECS: i64 = 300;

/// Event secrets travel as four 32-byte field ciphertexts:
/// price, total supply, tickets sold, resale markup.
pub const EVENT_SECRET_FIELDS: usize = 4;
