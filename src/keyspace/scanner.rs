//! Bounded cursor-based key enumeration.

use crate::client::{FerriteClient, ScanCursor};
use crate::error::{LensError, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default number of keys requested per `SCAN` batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Keys returned by a bounded scan, plus how much was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// At most `limit` keys, sorted.
    pub keys: Vec<String>,
    /// Keys received before truncation.
    pub scanned: usize,
    /// Whether the server handed back the start cursor.
    pub complete: bool,
}

impl ScanResult {
    /// Whether keys were dropped or the scan stopped before the cursor finished.
    pub fn is_truncated(&self) -> bool {
        self.scanned > self.keys.len() || !self.complete
    }

    /// A one-line notice for truncated listings, `None` otherwise.
    pub fn truncation_notice(&self) -> Option<String> {
        if !self.is_truncated() {
            return None;
        }
        let more = if self.complete { "" } else { "+" };
        Some(format!(
            "Showing first {} of {}{} keys",
            self.keys.len(),
            self.scanned,
            more
        ))
    }
}

/// Enumerates up to `limit` keys matching `pattern`, sorted lexicographically.
///
/// Batches are requested until the server hands back the start cursor or
/// `limit` keys have accumulated. The result is best-effort: keys changing
/// during the scan may be missed or repeated, and nothing is deduplicated.
///
/// A failed batch fails the whole scan; no partial result is returned.
/// Cancelling `cancel` abandons the in-flight batch and returns
/// [`LensError::Cancelled`].
pub async fn scan_keys(
    client: &dyn FerriteClient,
    pattern: &str,
    limit: usize,
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    Ok(scan_bounded(client, pattern, limit, batch_size, cancel)
        .await?
        .keys)
}

/// Like [`scan_keys`], also reporting whether the listing was cut short.
pub async fn scan_bounded(
    client: &dyn FerriteClient,
    pattern: &str,
    limit: usize,
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<ScanResult> {
    let mut keys = Vec::new();
    if limit == 0 {
        return Ok(ScanResult {
            keys,
            scanned: 0,
            complete: true,
        });
    }

    let mut cursor = ScanCursor::start();
    let mut batches = 0usize;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LensError::Cancelled),
            page = client.scan(&cursor, pattern, batch_size) => page,
        };
        let page = result.map_err(|e| {
            LensError::scan(format!(
                "batch {} of pattern '{}' failed: {}",
                batches + 1,
                pattern,
                e
            ))
        })?;

        batches += 1;
        keys.extend(page.keys);
        cursor = page.cursor;

        if cursor.is_start() || keys.len() >= limit {
            break;
        }
    }

    debug!(
        "Scanned {} keys for '{}' in {} batches",
        keys.len(),
        pattern,
        batches
    );

    let scanned = keys.len();
    keys.truncate(limit);
    keys.sort();
    Ok(ScanResult {
        keys,
        scanned,
        complete: cursor.is_start(),
    })
}
