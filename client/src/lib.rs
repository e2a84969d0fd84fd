//! Client wrapper for the private ticketing program.
//!
//! Every program operation goes through the same steps: encrypt the inputs
//! for the MXE, submit, wait for the cluster's callback, then decode and
//! decrypt whatever the callback logged for us.

pub mod api;
pub mod cipher;
pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logs;
pub mod pda;

pub use api::{EventView, NewEvent, PermissionGrant, TicketView, TicketingApi};
pub use cipher::{EncryptionKey, SharedCipher};
pub use client::{PollConfig, TicketingClient};
pub use config::{ArciumManifest, ClientConfig};
pub use error::ClientError;
pub use ledger::{Ledger, RpcLedger};
