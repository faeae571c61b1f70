//! Namespace grouping of scanned keys.
//!
//! Keys sharing a colon-delimited prefix are folded into one namespace entry
//! so that large keyspaces stay navigable.

use crate::client::{KeyType, Ttl};
use serde::Serialize;
use std::collections::HashMap;

/// Delimiter separating a namespace prefix from the rest of a key.
pub const NAMESPACE_DELIMITER: char = ':';

/// A scanned key plus its lazily fetched metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyRecord {
    /// Full key name, usable for re-querying the key.
    pub key: String,
    pub key_type: Option<KeyType>,
    pub ttl: Option<Ttl>,
    /// Text to display for the key.
    pub label: String,
}

impl KeyRecord {
    /// Creates a record without metadata, labelled with the full key.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            key_type: None,
            ttl: None,
        }
    }

    /// Attaches type and TTL metadata.
    pub fn with_metadata(mut self, key_type: KeyType, ttl: Ttl) -> Self {
        self.key_type = Some(key_type);
        self.ttl = Some(ttl);
        self
    }

    /// Replaces the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Label followed by type and TTL, when known: `name  [hash, 5m]`.
    pub fn describe(&self) -> String {
        match (&self.key_type, &self.ttl) {
            (Some(key_type), Some(ttl)) => format!("{}  [{}, {}]", self.label, key_type, ttl),
            (Some(key_type), None) => format!("{}  [{}]", self.label, key_type),
            _ => self.label.clone(),
        }
    }
}

/// Keys sharing a namespace prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceGroup {
    /// Prefix up to and including the delimiter, e.g. `user:`.
    pub prefix: String,
    pub keys: Vec<KeyRecord>,
}

impl NamespaceGroup {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Display label: prefix and member count.
    pub fn label(&self) -> String {
        format!("{}  ({})", self.prefix, self.keys.len())
    }
}

/// One entry of a browse listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KeyNode {
    Namespace(NamespaceGroup),
    Key(KeyRecord),
    /// A single diagnostic line shown instead of a listing.
    Placeholder { message: String },
}

impl KeyNode {
    /// Display label for the entry.
    pub fn label(&self) -> String {
        match self {
            Self::Namespace(group) => group.label(),
            Self::Key(record) => record.describe(),
            Self::Placeholder { message } => message.clone(),
        }
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, Self::Namespace(_))
    }
}

/// Returns the namespace prefix of `key`, if it has one.
///
/// The prefix ends at the first delimiter, which qualifies only if it is
/// neither the first nor the last character of the key.
pub fn namespace_prefix(key: &str) -> Option<&str> {
    let index = key.find(NAMESPACE_DELIMITER)?;
    if index == 0 || index + NAMESPACE_DELIMITER.len_utf8() == key.len() {
        return None;
    }
    Some(&key[..=index])
}

/// Groups keys into namespaces.
///
/// Namespaces with at least two members come first, in order of first
/// appearance. Keys without a prefix follow in input order, then the sole
/// members of dissolved single-key namespaces.
pub fn group_keys<S: AsRef<str>>(keys: &[S]) -> Vec<KeyNode> {
    let mut buckets: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut ungrouped = Vec::new();

    for key in keys {
        let key = key.as_ref();
        match namespace_prefix(key) {
            Some(prefix) => match index.get(prefix) {
                Some(&slot) => buckets[slot].1.push(key.to_string()),
                None => {
                    index.insert(prefix.to_string(), buckets.len());
                    buckets.push((prefix.to_string(), vec![key.to_string()]));
                }
            },
            None => ungrouped.push(key.to_string()),
        }
    }

    let mut namespaces = Vec::new();
    for (prefix, members) in buckets {
        if members.len() > 1 {
            namespaces.push(KeyNode::Namespace(NamespaceGroup {
                prefix,
                keys: members.into_iter().map(KeyRecord::new).collect(),
            }));
        } else {
            ungrouped.extend(members);
        }
    }

    namespaces.extend(ungrouped.into_iter().map(|k| KeyNode::Key(KeyRecord::new(k))));
    namespaces
}
