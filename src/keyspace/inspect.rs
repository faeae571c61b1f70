//! Detail view of a single key.

use crate::client::{FerriteClient, KeyType, Reply, Ttl};
use crate::error::Result;
use serde::Serialize;
use tracing::debug;

/// Maximum number of stream entries fetched for inspection.
pub const STREAM_PREVIEW_COUNT: usize = 100;

/// The value part of an inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectedValue {
    Fetched(Reply),
    /// The key does not exist.
    Missing,
    /// The key holds a type with no known reader.
    Unsupported { type_name: String },
}

impl InspectedValue {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Fetched(reply) => reply.to_json(),
            Self::Missing => serde_json::Value::Null,
            Self::Unsupported { type_name } => serde_json::Value::String(format!("({type_name})")),
        }
    }
}

/// Type, TTL and value of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInspection {
    pub key: String,
    pub key_type: KeyType,
    pub ttl: Ttl,
    pub value: InspectedValue,
}

#[derive(Serialize)]
struct InspectionView<'a> {
    key: &'a str,
    #[serde(rename = "type")]
    key_type: &'a str,
    ttl: String,
    value: serde_json::Value,
}

impl KeyInspection {
    /// Renders the inspection as pretty JSON with fields `key`, `type`, `ttl`, `value`.
    ///
    /// TTL is `persistent`, `expired` or a number of seconds such as `42s`.
    pub fn to_json(&self) -> String {
        let ttl = match self.ttl {
            Ttl::Persistent => "persistent".to_string(),
            Ttl::Expired => "expired".to_string(),
            Ttl::Seconds(s) => format!("{s}s"),
        };
        let view = InspectionView {
            key: &self.key,
            key_type: self.key_type.as_str(),
            ttl,
            value: self.value.to_json(),
        };
        serde_json::to_string_pretty(&view).unwrap_or_else(|_| self.key.clone())
    }
}

/// Fetches the type, TTL and full value of `key`.
pub async fn inspect_key(client: &dyn FerriteClient, key: &str) -> Result<KeyInspection> {
    let key_type = client.key_type(key).await?;
    let ttl = client.ttl(key).await?;
    debug!("Inspecting '{}' ({}, {})", key, key_type, ttl);

    let args = |extra: &[&str]| -> Vec<String> {
        std::iter::once(key.to_string())
            .chain(extra.iter().map(|s| s.to_string()))
            .collect()
    };

    let value = match &key_type {
        KeyType::String => InspectedValue::Fetched(client.call("GET", &args(&[])).await?),
        KeyType::Hash => {
            InspectedValue::Fetched(client.call("HGETALL", &args(&[])).await?.into_pairs())
        }
        KeyType::List => InspectedValue::Fetched(client.call("LRANGE", &args(&["0", "-1"])).await?),
        KeyType::Set => InspectedValue::Fetched(client.call("SMEMBERS", &args(&[])).await?),
        KeyType::SortedSet => InspectedValue::Fetched(
            client
                .call("ZRANGE", &args(&["0", "-1", "WITHSCORES"]))
                .await?,
        ),
        KeyType::Stream => {
            let count = STREAM_PREVIEW_COUNT.to_string();
            InspectedValue::Fetched(
                client
                    .call("XRANGE", &args(&["-", "+", "COUNT", count.as_str()]))
                    .await?,
            )
        }
        KeyType::None => InspectedValue::Missing,
        KeyType::Unknown(tag) => InspectedValue::Unsupported {
            type_name: tag.clone(),
        },
    };

    Ok(KeyInspection {
        key: key.to_string(),
        key_type,
        ttl,
        value,
    })
}
