//! HTTP backend for the private ticketing demo.
//!
//! Mirrors events and tickets into memory for fast listing and proxies every
//! write to the ticketing client.

pub mod config;
pub mod error;
pub mod routes;
pub mod service;
pub mod store;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::configure;
pub use service::Mirror;
pub use store::MirrorStore;
