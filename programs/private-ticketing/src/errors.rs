use anchor_lang::prelude::*;

#[error_code]
pub enum TicketingError {
    #[msg("Event name cannot be empty")]
    EventNameEmpty,

    #[msg("Event name exceeds maximum length")]
    EventNameTooLong,

    #[msg("Event date must be in the future")]
    EventDateInPast,

    #[msg("Event is still waiting for the MXE to validate its ciphertexts")]
    EventNotActive,

    #[msg("Event ciphertexts were already validated")]
    EventAlreadyActive,

    #[msg("Another purchase for this event is still being computed")]
    PurchaseInProgress,

    #[msg("Purchase result was already recorded")]
    PurchaseSettled,

    #[msg("No purchase has been pending long enough to clear")]
    PurchaseNotStale,

    #[msg("Ticket is not in the sold state")]
    TicketNotSold,

    #[msg("Ticket does not belong to this event")]
    EventMismatch,

    #[msg("Caller does not own this ticket")]
    NotOwner,

    #[msg("Recipient must be a different, non-default address")]
    InvalidRecipient,

    #[msg("Owner already holds the maximum number of tickets")]
    TooManyTickets,

    #[msg("Resale is not allowed for this event")]
    ResaleNotAllowed,

    #[msg("Only the event organizer may do this")]
    NotOrganizer,

    #[msg("Permission denied")]
    PermissionDenied,

    #[msg("Unknown operation name")]
    UnknownOperation,

    #[msg("String parameter exceeds maximum length")]
    ParameterTooLong,

    #[msg("Validity window ends before it starts")]
    InvalidWindow,

    #[msg("Unauthorized")]
    Unauthorized,

    #[msg("No MXE cluster is configured")]
    MpcUnavailable,

    #[msg("Callback was not invoked by the Arcium program")]
    UnauthorizedCallback,

    #[msg("Identifier counter overflow")]
    Overflow,
}
