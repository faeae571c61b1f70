//! Server client abstraction for ferrite-lens.
//!
//! Provides a trait-based interface to a Ferrite server, allowing the real
//! network client and in-memory test doubles to be used interchangeably.

mod mock;
mod remote;
mod types;

pub use mock::{FailingFerriteClient, MockFerriteClient};
pub use remote::{retry_delay, RemoteClient};
pub use types::{KeyType, Reply, ScanCursor, ScanPage, Ttl};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Creates a client for the given configuration.
///
/// This is the central factory function for server connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn FerriteClient>> {
    let client = RemoteClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for Ferrite clients.
///
/// All operations are async and return Results with LensError. Implementors
/// only issue requests; they never change which database is selected.
#[async_trait]
pub trait FerriteClient: Send + Sync {
    /// Invokes a command with positional arguments and returns its reply.
    async fn call(&self, command: &str, args: &[String]) -> Result<Reply>;

    /// Fetches one batch of keys matching `pattern`, continuing from `cursor`.
    async fn scan(&self, cursor: &ScanCursor, pattern: &str, count: usize) -> Result<ScanPage>;

    /// Returns the type of the value stored at `key`.
    async fn key_type(&self, key: &str) -> Result<KeyType>;

    /// Returns the time-to-live of `key`.
    async fn ttl(&self, key: &str) -> Result<Ttl>;

    /// Returns the raw `INFO` text, optionally restricted to one section.
    async fn info(&self, section: Option<&str>) -> Result<String>;

    /// Closes the connection.
    async fn close(&self) -> Result<()>;
}
