//! Connection management for ferrite-lens.
//!
//! Centralizes the lifecycle of the session's single server connection.

pub mod manager;

pub use manager::{ActiveConnection, ConnectionManager};
