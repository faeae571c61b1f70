//! Reply and metadata types for ferrite-lens.
//!
//! Defines the values returned by a Ferrite server and the per-key metadata
//! (type, time-to-live) used while browsing the keyspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed reply returned by the server for an invoked command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Reply {
    /// The nil sentinel ("key absent" or "no result").
    #[default]
    Nil,

    /// Simple status reply such as `OK` or `PONG`.
    Status(String),

    /// Bulk string payload.
    Bulk(String),

    /// Integer reply.
    Integer(i64),

    /// Floating point reply (RESP3 doubles).
    Double(f64),

    /// Boolean reply (RESP3).
    Boolean(bool),

    /// Ordered sequence of replies.
    Array(Vec<Reply>),

    /// Key/value pairs (RESP3 maps, or folded HGETALL output).
    Map(Vec<(Reply, Reply)>),
}

impl Reply {
    /// Returns true if this reply is the nil sentinel.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Returns the elements if this reply is a sequence.
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the text of a status or bulk reply.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) | Reply::Bulk(s) => Some(s),
            _ => None,
        }
    }

    /// Folds a flat `[field, value, field, value, ...]` array into a map.
    ///
    /// Arrays of odd length and non-array replies are returned unchanged.
    pub fn into_pairs(self) -> Reply {
        match self {
            Reply::Array(items) if items.len() % 2 == 0 => {
                let mut pairs = Vec::with_capacity(items.len() / 2);
                let mut iter = items.into_iter();
                while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
                    pairs.push((field, value));
                }
                Reply::Map(pairs)
            }
            other => other,
        }
    }

    /// Converts the reply to a JSON value for structural rendering.
    ///
    /// Map keys are rendered through [`Reply::to_raw_string`].
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Reply::Nil => Json::Null,
            Reply::Status(s) | Reply::Bulk(s) => Json::String(s.clone()),
            Reply::Integer(n) => Json::from(*n),
            Reply::Double(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Reply::Boolean(b) => Json::Bool(*b),
            Reply::Array(items) => Json::Array(items.iter().map(Reply::to_json).collect()),
            Reply::Map(pairs) => Json::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_raw_string(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Bare string coercion of the reply.
    ///
    /// Nested nils coerce to the empty string and sequences are comma-joined,
    /// so `["a", nil, 3]` becomes `a,,3`.
    pub fn to_raw_string(&self) -> String {
        match self {
            Reply::Nil => String::new(),
            Reply::Status(s) | Reply::Bulk(s) => s.clone(),
            Reply::Integer(n) => n.to_string(),
            Reply::Double(f) => f.to_string(),
            Reply::Boolean(b) => b.to_string(),
            Reply::Array(items) => items
                .iter()
                .map(Reply::to_raw_string)
                .collect::<Vec<_>>()
                .join(","),
            Reply::Map(pairs) => pairs
                .iter()
                .flat_map(|(k, v)| [k.to_raw_string(), v.to_raw_string()])
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw_string())
    }
}

impl From<i64> for Reply {
    fn from(v: i64) -> Self {
        Reply::Integer(v)
    }
}

impl From<f64> for Reply {
    fn from(v: f64) -> Self {
        Reply::Double(v)
    }
}

impl From<bool> for Reply {
    fn from(v: bool) -> Self {
        Reply::Boolean(v)
    }
}

impl From<String> for Reply {
    fn from(v: String) -> Self {
        Reply::Bulk(v)
    }
}

impl From<&str> for Reply {
    fn from(v: &str) -> Self {
        Reply::Bulk(v.to_string())
    }
}

impl<T> From<Option<T>> for Reply
where
    T: Into<Reply>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Reply::Nil,
        }
    }
}

impl<T> From<Vec<T>> for Reply
where
    T: Into<Reply>,
{
    fn from(v: Vec<T>) -> Self {
        Reply::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Continuation token for cursor-based key enumeration.
///
/// The server hands back the start sentinel once enumeration is complete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanCursor(String);

impl ScanCursor {
    /// The sentinel value that both starts and terminates a scan.
    pub const START: &'static str = "0";

    /// Returns the cursor a new scan begins from.
    pub fn start() -> Self {
        Self(Self::START.to_string())
    }

    /// Wraps a cursor value returned by the server.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns true if this cursor is the sentinel.
    pub fn is_start(&self) -> bool {
        self.0 == Self::START
    }

    /// Returns the raw cursor value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScanCursor {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for ScanCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One batch of a cursor-based scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Cursor to continue from; the sentinel when enumeration is complete.
    pub cursor: ScanCursor,
    /// Keys returned in this batch.
    pub keys: Vec<String>,
}

impl ScanPage {
    /// Creates a page from a cursor and its keys.
    pub fn new(cursor: ScanCursor, keys: Vec<String>) -> Self {
        Self { cursor, keys }
    }
}

/// Value type tag reported by `TYPE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    String,
    List,
    Hash,
    Set,
    SortedSet,
    Stream,
    /// The key does not exist.
    None,
    /// A type tag this client does not know about (module types, future types).
    Unknown(String),
}

impl KeyType {
    /// Parses the tag returned by `TYPE`.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "string" => Self::String,
            "list" => Self::List,
            "hash" => Self::Hash,
            "set" => Self::Set,
            "zset" => Self::SortedSet,
            "stream" => Self::Stream,
            "none" => Self::None,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the tag as the server spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::List => "list",
            Self::Hash => "hash",
            Self::Set => "set",
            Self::SortedSet => "zset",
            Self::Stream => "stream",
            Self::None => "none",
            Self::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-to-live of a key as reported by `TTL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ttl {
    /// The key exists and has no expiry (`-1`).
    Persistent,
    /// The key has expired or does not exist (`-2`).
    Expired,
    /// Seconds until expiry.
    Seconds(u64),
}

impl Ttl {
    /// Interprets the integer returned by `TTL`.
    pub fn from_seconds(raw: i64) -> Self {
        match raw {
            -1 => Self::Persistent,
            n if n < 0 => Self::Expired,
            n => Self::Seconds(n as u64),
        }
    }

    /// Short human label: `persistent`, `expired`, `42s`, `5m`, `3h`.
    pub fn label(&self) -> String {
        match self {
            Self::Persistent => "persistent".to_string(),
            Self::Expired => "expired".to_string(),
            Self::Seconds(s) if *s < 60 => format!("{s}s"),
            Self::Seconds(s) if *s < 3600 => format!("{}m", s / 60),
            Self::Seconds(s) => format!("{}h", s / 3600),
        }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_raw_string() {
        assert_eq!(Reply::Nil.to_raw_string(), "");
        assert_eq!(Reply::Status("OK".to_string()).to_raw_string(), "OK");
        assert_eq!(Reply::Integer(42).to_raw_string(), "42");
        assert_eq!(Reply::Double(2.5).to_raw_string(), "2.5");
        assert_eq!(Reply::Boolean(true).to_raw_string(), "true");
        assert_eq!(
            Reply::Array(vec![Reply::from("a"), Reply::Nil, Reply::Integer(3)]).to_raw_string(),
            "a,,3"
        );
    }

    #[test]
    fn test_reply_to_json() {
        let reply = Reply::Array(vec![Reply::from("a"), Reply::Integer(1), Reply::Nil]);
        assert_eq!(reply.to_json(), serde_json::json!(["a", 1, null]));

        let map = Reply::Map(vec![(Reply::from("name"), Reply::from("Alice"))]);
        assert_eq!(map.to_json(), serde_json::json!({"name": "Alice"}));
    }

    #[test]
    fn test_reply_into_pairs() {
        let flat = Reply::from(vec!["name", "Alice", "email", "a@x.io"]);
        assert_eq!(
            flat.into_pairs(),
            Reply::Map(vec![
                (Reply::from("name"), Reply::from("Alice")),
                (Reply::from("email"), Reply::from("a@x.io")),
            ])
        );

        let odd = Reply::from(vec!["a", "b", "c"]);
        assert_eq!(odd.clone().into_pairs(), odd);
    }

    #[test]
    fn test_reply_from_conversions() {
        assert_eq!(Reply::from(None::<String>), Reply::Nil);
        assert_eq!(Reply::from(Some("x")), Reply::Bulk("x".to_string()));
        assert_eq!(Reply::from(7i64), Reply::Integer(7));
    }

    #[test]
    fn test_scan_cursor_sentinel() {
        assert!(ScanCursor::start().is_start());
        assert!(ScanCursor::new("0").is_start());
        assert!(!ScanCursor::new("17").is_start());
        assert_eq!(ScanCursor::default().as_str(), "0");
    }

    #[test]
    fn test_key_type_parse() {
        assert_eq!(KeyType::parse("string"), KeyType::String);
        assert_eq!(KeyType::parse("zset"), KeyType::SortedSet);
        assert_eq!(KeyType::parse("none"), KeyType::None);
        assert_eq!(
            KeyType::parse("ReJSON-RL"),
            KeyType::Unknown("ReJSON-RL".to_string())
        );
        assert_eq!(KeyType::SortedSet.as_str(), "zset");
    }

    #[test]
    fn test_ttl_labels() {
        assert_eq!(Ttl::from_seconds(-1), Ttl::Persistent);
        assert_eq!(Ttl::from_seconds(-2), Ttl::Expired);
        assert_eq!(Ttl::from_seconds(-1).label(), "persistent");
        assert_eq!(Ttl::from_seconds(-2).label(), "expired");
        assert_eq!(Ttl::from_seconds(0).label(), "0s");
        assert_eq!(Ttl::from_seconds(59).label(), "59s");
        assert_eq!(Ttl::from_seconds(60).label(), "1m");
        assert_eq!(Ttl::from_seconds(3599).label(), "59m");
        assert_eq!(Ttl::from_seconds(7200).label(), "2h");
    }
}
