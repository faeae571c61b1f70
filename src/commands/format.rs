//! Reply formatting for display.
//!
//! Renders a server [`Reply`] as text in one of three modes. Formatting is
//! total: unknown mode names fall back to raw output instead of failing.

use crate::client::Reply;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format for command replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    /// Pretty-printed JSON with two-space indentation.
    #[default]
    Json,
    /// Numbered `1) "a"` lines for sequences, raw text otherwise.
    Table,
    /// Bare string coercion.
    Raw,
}

impl OutputFormat {
    /// Returns the format name as used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Table => "table",
            Self::Raw => "raw",
        }
    }

    /// Parses a format name, falling back to [`OutputFormat::Raw`] for anything unknown.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::Raw)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            "raw" => Ok(Self::Raw),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: json, table, or raw"
            )),
        }
    }
}

impl From<String> for OutputFormat {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a reply for display.
///
/// A nil reply renders as `(nil)` regardless of mode.
pub fn format_reply(reply: &Reply, format: OutputFormat) -> String {
    if reply.is_nil() {
        return "(nil)".to_string();
    }

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&reply.to_json())
            .unwrap_or_else(|_| reply.to_raw_string()),
        OutputFormat::Table => match reply.as_array() {
            Some(items) => format_numbered(items),
            None => reply.to_raw_string(),
        },
        OutputFormat::Raw => reply.to_raw_string(),
    }
}

/// Renders `1) <json>` lines, one per element.
fn format_numbered(items: &[Reply]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}) {}", i + 1, item.to_json()))
        .collect::<Vec<_>>()
        .join("\n")
}
