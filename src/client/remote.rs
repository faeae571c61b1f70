//! Network client implementation.
//!
//! Provides the `RemoteClient` struct that implements the `FerriteClient`
//! trait over a multiplexed async connection from the `redis` crate.

use crate::client::{FerriteClient, KeyType, Reply, ScanCursor, ScanPage, Ttl};
use crate::config::ConnectionConfig;
use crate::error::{LensError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tracing::{debug, warn};

/// Time allowed for establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of reconnection attempts after the first failure.
const MAX_RETRIES: u32 = 3;

/// Delay step between retry attempts (grows linearly).
const RETRY_STEP_MS: u64 = 200;

/// Upper bound on the delay between retry attempts.
const RETRY_CAP_MS: u64 = 2000;

/// Returns the delay before retry number `attempt` (1-based), or `None` once
/// the retry budget is spent.
pub fn retry_delay(attempt: u32) -> Option<Duration> {
    if attempt == 0 || attempt > MAX_RETRIES {
        return None;
    }
    let millis = (u64::from(attempt) * RETRY_STEP_MS).min(RETRY_CAP_MS);
    Some(Duration::from_millis(millis))
}

/// Ferrite client backed by a multiplexed connection.
#[derive(Clone)]
pub struct RemoteClient {
    connection: MultiplexedConnection,
}

impl RemoteClient {
    /// Connects to the server described by `config`, retrying transient failures.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let client = redis::Client::open(config.to_connection_string())
            .map_err(|e| LensError::config(format!("Invalid connection settings: {e}")))?;

        let mut attempt = 0;
        loop {
            debug!("Connecting to {} (attempt {})", config.display_string(), attempt + 1);

            let err = match tokio::time::timeout(
                CONNECT_TIMEOUT,
                client.get_multiplexed_async_connection(),
            )
            .await
            {
                Ok(Ok(connection)) => {
                    debug!("Connected to {}", config.display_string());
                    return Ok(Self { connection });
                }
                Ok(Err(e)) => ConnectFailure::Redis(e),
                Err(_) => ConnectFailure::TimedOut,
            };

            attempt += 1;
            match retry_delay(attempt).filter(|_| err.is_transient()) {
                Some(delay) => {
                    warn!(
                        "Connection attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        err.message(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(map_connection_error(&err, config)),
            }
        }
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut connection = self.connection.clone();
        cmd.query_async(&mut connection).await.map_err(map_command_error)
    }
}

#[async_trait]
impl FerriteClient for RemoteClient {
    async fn call(&self, command: &str, args: &[String]) -> Result<Reply> {
        let mut cmd = redis::cmd(command);
        for arg in args {
            cmd.arg(arg);
        }
        let value: redis::Value = self.query(&cmd).await?;
        Ok(Reply::from(value))
    }

    async fn scan(&self, cursor: &ScanCursor, pattern: &str, count: usize) -> Result<ScanPage> {
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor.as_str())
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count);
        let (next, keys): (String, Vec<String>) = self.query(&cmd).await?;
        Ok(ScanPage::new(ScanCursor::new(next), keys))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        let mut cmd = redis::cmd("TYPE");
        cmd.arg(key);
        let tag: String = self.query(&cmd).await?;
        Ok(KeyType::parse(&tag))
    }

    async fn ttl(&self, key: &str) -> Result<Ttl> {
        let mut cmd = redis::cmd("TTL");
        cmd.arg(key);
        let seconds: i64 = self.query(&cmd).await?;
        Ok(Ttl::from_seconds(seconds))
    }

    async fn info(&self, section: Option<&str>) -> Result<String> {
        let mut cmd = redis::cmd("INFO");
        if let Some(section) = section {
            cmd.arg(section);
        }
        self.query(&cmd).await
    }

    async fn close(&self) -> Result<()> {
        // The multiplexed connection closes when its last handle is dropped;
        // QUIT only tells the server early, so its failure is not an error.
        if let Err(e) = self.query::<redis::Value>(&redis::cmd("QUIT")).await {
            debug!("QUIT failed while closing: {}", e);
        }
        Ok(())
    }
}

impl From<redis::Value> for Reply {
    fn from(value: redis::Value) -> Self {
        match value {
            redis::Value::Nil => Reply::Nil,
            redis::Value::Int(n) => Reply::Integer(n),
            redis::Value::BulkString(bytes) => {
                Reply::Bulk(String::from_utf8_lossy(&bytes).into_owned())
            }
            redis::Value::SimpleString(s) => Reply::Status(s),
            redis::Value::Okay => Reply::Status("OK".to_string()),
            redis::Value::Array(items) | redis::Value::Set(items) => {
                Reply::Array(items.into_iter().map(Reply::from).collect())
            }
            redis::Value::Map(pairs) => Reply::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| (Reply::from(k), Reply::from(v)))
                    .collect(),
            ),
            redis::Value::Double(f) => Reply::Double(f),
            redis::Value::Boolean(b) => Reply::Boolean(b),
            redis::Value::VerbatimString { text, .. } => Reply::Bulk(text),
            other => Reply::Status(format!("{other:?}")),
        }
    }
}

/// Why a single connection attempt failed.
enum ConnectFailure {
    Redis(redis::RedisError),
    TimedOut,
}

impl ConnectFailure {
    fn message(&self) -> String {
        match self {
            Self::Redis(e) => e.to_string(),
            Self::TimedOut => format!("timed out after {:?}", CONNECT_TIMEOUT),
        }
    }

    /// Refused connections and timeouts are worth retrying; auth errors are not.
    fn is_transient(&self) -> bool {
        match self {
            Self::TimedOut => true,
            Self::Redis(e) => {
                if is_auth_error(&e.to_string()) {
                    return false;
                }
                e.is_connection_refusal() || e.is_timeout() || e.is_io_error()
            }
        }
    }
}

fn is_auth_error(message: &str) -> bool {
    let upper = message.to_uppercase();
    upper.contains("NOAUTH") || upper.contains("AUTH") || upper.contains("WRONGPASS")
}

/// Maps a failed connection attempt to a user-facing message with a hint.
fn map_connection_error(err: &ConnectFailure, config: &ConnectionConfig) -> LensError {
    let target = config.display_string();
    let message = err.message();
    let lower = message.to_lowercase();

    let hint = if matches!(err, ConnectFailure::TimedOut)
        || lower.contains("timed out")
        || lower.contains("timeout")
    {
        "Check that the server is reachable and the port is correct."
    } else if lower.contains("refused") {
        "Ensure the Ferrite server is running on the specified host and port."
    } else if is_auth_error(&message) {
        "Verify your authentication password in the connection settings."
    } else {
        ""
    };

    if hint.is_empty() {
        LensError::connection(format!("Failed to connect to {target}: {message}"))
    } else {
        LensError::connection(format!("Failed to connect to {target}: {message}. {hint}"))
    }
}

/// Maps an error from a command round trip.
///
/// Replies the server rejected keep their message verbatim; anything that
/// broke the transport becomes a connection error.
fn map_command_error(e: redis::RedisError) -> LensError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        return LensError::connection(e.to_string());
    }

    // Rebuild `CODE detail` as the server sent it; the crate's Display
    // rewords the code into its own error kind.
    match (e.code(), e.detail()) {
        (Some(code), Some(detail)) => LensError::command(format!("{code} {detail}")),
        (Some(code), None) => LensError::command(code),
        _ => LensError::command(e.to_string()),
    }
}
