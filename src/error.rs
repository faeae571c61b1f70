//! Error types for ferrite-lens.
//!
//! Defines the main error enum used throughout the application. Tokenizing
//! and formatting never fail; everything that talks to a server does.

use thiserror::Error;

/// Main error type for ferrite-lens operations.
#[derive(Error, Debug)]
pub enum LensError {
    /// Connection errors (host unreachable, auth failed, timeouts, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected an invoked command. Carries the server's message verbatim.
    #[error("Command error: {0}")]
    Command(String),

    /// A keyspace scan failed part way through. No partial results are kept.
    #[error("Scan error: {0}")]
    Scan(String),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LensError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a command error with the given message.
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Creates a scan error with the given message.
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Command(_) => "Command Error",
            Self::Scan(_) => "Scan Error",
            Self::Cancelled => "Cancelled",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the error came from losing or failing to reach the server.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type alias using LensError.
pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_connection() {
        let err = LensError::connection("Cannot connect to localhost:6379");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to localhost:6379"
        );
        assert_eq!(err.category(), "Connection Error");
        assert!(err.is_connection());
    }

    #[test]
    fn test_error_display_command() {
        let err = LensError::command("ERR unknown command 'FOO'");
        assert_eq!(err.to_string(), "Command error: ERR unknown command 'FOO'");
        assert_eq!(err.category(), "Command Error");
        assert!(!err.is_connection());
    }

    #[test]
    fn test_error_display_scan() {
        let err = LensError::scan("connection reset during SCAN");
        assert_eq!(err.to_string(), "Scan error: connection reset during SCAN");
        assert_eq!(err.category(), "Scan Error");
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(LensError::Cancelled.to_string(), "Operation cancelled");
        assert_eq!(LensError::Cancelled.category(), "Cancelled");
    }

    #[test]
    fn test_error_display_config() {
        let err = LensError::config("Invalid scheme 'http'");
        assert_eq!(err.to_string(), "Configuration error: Invalid scheme 'http'");
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_internal() {
        let err = LensError::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
        assert_eq!(err.category(), "Internal Error");
    }

    #[test]
    fn test_display_names_category_once() {
        let errors = [
            LensError::connection("refused"),
            LensError::command("ERR unknown command 'FOO'"),
            LensError::scan("batch 2 failed"),
            LensError::Cancelled,
            LensError::config("bad scheme"),
            LensError::internal("oops"),
        ];

        for err in errors {
            let shown = err.to_string().to_lowercase();
            let category = err.category().to_lowercase();
            assert_eq!(shown.matches(&category).count(), 1, "{shown}");
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LensError>();
    }
}
