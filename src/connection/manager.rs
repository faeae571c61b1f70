//! Connection manager for the session's server connection.

use crate::client::FerriteClient;
use crate::config::ConnectionConfig;
use crate::error::{LensError, Result};
use crate::info::server_version;
use tracing::{debug, info, warn};

/// An active server connection with its metadata.
pub struct ActiveConnection {
    /// Connection name (if using a saved connection).
    pub name: Option<String>,
    /// Server client.
    pub client: Box<dyn FerriteClient>,
    /// Version reported by `INFO server`.
    pub server_version: String,
}

/// Owns at most one server connection for a session.
///
/// Components receive the client from here instead of reaching for shared
/// global state.
#[derive(Default)]
pub struct ConnectionManager {
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    /// Creates a manager with no connection.
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Creates a manager around an existing client.
    pub async fn with_connection(
        client: Box<dyn FerriteClient>,
        name: Option<String>,
    ) -> Self {
        let server_version = fetch_version(client.as_ref()).await;
        Self {
            active: Some(ActiveConnection {
                name,
                client,
                server_version,
            }),
        }
    }

    /// Connects using the given configuration, replacing and closing any
    /// previous connection.
    pub async fn connect(&mut self, config: &ConnectionConfig, name: Option<String>) -> Result<()> {
        let client = crate::client::connect(config).await?;
        self.replace(client, name).await;
        Ok(())
    }

    /// Installs `client` as the active connection, closing the previous one.
    pub async fn replace(&mut self, client: Box<dyn FerriteClient>, name: Option<String>) {
        let server_version = fetch_version(client.as_ref()).await;

        if let Some(old) = self.active.take() {
            if let Err(e) = old.client.close().await {
                warn!("Failed to close previous connection: {}", e);
            }
        }

        info!(
            "Connected{} (Ferrite {})",
            name.as_deref().map(|n| format!(" to '{n}'")).unwrap_or_default(),
            server_version
        );
        self.active = Some(ActiveConnection {
            name,
            client,
            server_version,
        });
    }

    /// Get the active client.
    pub fn client(&self) -> Option<&dyn FerriteClient> {
        self.active.as_ref().map(|c| c.client.as_ref())
    }

    /// Get the active client, failing if there is none.
    pub fn require_client(&self) -> Result<&dyn FerriteClient> {
        self.client()
            .ok_or_else(|| LensError::connection("Not connected to Ferrite"))
    }

    /// Get the current connection name.
    pub fn current_name(&self) -> Option<&str> {
        self.active.as_ref().and_then(|c| c.name.as_deref())
    }

    /// Get the server version of the active connection.
    pub fn server_version(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.server_version.as_str())
    }

    /// Check if there's an active connection.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Close the active connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.active.take() {
            conn.client.close().await?;
        }
        Ok(())
    }

    /// Close the active connection, logging rather than returning close errors.
    pub async fn disconnect(&mut self) {
        if let Err(e) = self.close().await {
            warn!("Error while disconnecting: {}", e);
        }
    }
}

async fn fetch_version(client: &dyn FerriteClient) -> String {
    match client.info(Some("server")).await {
        Ok(text) => server_version(&text),
        Err(e) => {
            debug!("Could not read server version: {}", e);
            "unknown".to_string()
        }
    }
}
