//! State account definitions

pub mod event;
pub mod owner_tickets;
pub mod permission;
pub mod registry;
pub mod ticket;

pub use event::*;
pub use owner_tickets::*;
pub use permission::*;
pub use registry::*;
pub use ticket::*;
