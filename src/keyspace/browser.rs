//! Browse session over the keyspace.
//!
//! `KeyBrowser` tracks what is currently listed (the root, or the members of
//! one namespace) and rebuilds the listing from a fresh scan on every request.
//! Nothing is cached between requests.

use super::grouper::{group_keys, KeyNode, KeyRecord};
use super::pattern::prefix_pattern;
use super::scanner::{scan_bounded, ScanResult};
use crate::client::FerriteClient;
use crate::config::BrowserConfig;
use crate::error::{LensError, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shown when there is no connection to browse.
pub const DISCONNECTED_PLACEHOLDER: &str = "Connect to browse keys";

/// Shown when listing failed.
pub const ERROR_PLACEHOLDER: &str = "Error loading keys";

/// What the browser is currently displaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseState {
    /// No connection; the listing is a single placeholder.
    Disconnected,
    /// Namespaces and ungrouped keys of the whole keyspace.
    RootListed,
    /// Members of one namespace.
    NamespaceListed { prefix: String },
    /// The last listing failed; the listing is a single placeholder.
    Errored { message: String },
}

/// Keyspace browser holding the current listing.
#[derive(Debug)]
pub struct KeyBrowser {
    settings: BrowserConfig,
    state: BrowseState,
    entries: Vec<KeyNode>,
}

impl KeyBrowser {
    /// Creates a browser in the disconnected state.
    pub fn new(settings: BrowserConfig) -> Self {
        Self {
            settings,
            state: BrowseState::Disconnected,
            entries: vec![placeholder(DISCONNECTED_PLACEHOLDER)],
        }
    }

    pub fn state(&self) -> &BrowseState {
        &self.state
    }

    /// The current listing.
    pub fn entries(&self) -> &[KeyNode] {
        &self.entries
    }

    pub fn settings(&self) -> &BrowserConfig {
        &self.settings
    }

    /// Lists the root of the keyspace: namespaces first, then ungrouped keys.
    ///
    /// Without a client the listing becomes the disconnected placeholder.
    /// A failed scan leaves the browser in [`BrowseState::Errored`] and returns
    /// the error; a cancelled one leaves the previous listing untouched.
    pub async fn list_root(
        &mut self,
        client: Option<&dyn FerriteClient>,
        cancel: &CancellationToken,
    ) -> Result<&[KeyNode]> {
        self.list_root_matching(client, "*", cancel).await
    }

    /// Like [`KeyBrowser::list_root`], restricted to keys matching `pattern`.
    pub async fn list_root_matching(
        &mut self,
        client: Option<&dyn FerriteClient>,
        pattern: &str,
        cancel: &CancellationToken,
    ) -> Result<&[KeyNode]> {
        let Some(client) = client else {
            self.show_disconnected();
            return Ok(&self.entries);
        };

        let settings = self.settings;
        let result = scan_bounded(
            client,
            pattern,
            settings.root_limit,
            settings.batch_size,
            cancel,
        )
        .await;

        match result {
            Ok(scan) => {
                let mut entries = group_keys(&scan.keys);
                debug!(
                    "Root listing: {} keys in {} entries",
                    scan.keys.len(),
                    entries.len()
                );
                push_notice(&mut entries, &scan);
                self.show(BrowseState::RootListed, entries);
                Ok(&self.entries)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Lists the keys under `prefix` with their type and TTL.
    ///
    /// Each key is labelled with the prefix stripped and keeps its full name
    /// for later inspection.
    pub async fn expand_namespace(
        &mut self,
        client: Option<&dyn FerriteClient>,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<&[KeyNode]> {
        let Some(client) = client else {
            self.show_disconnected();
            return Ok(&self.entries);
        };

        match self.load_namespace(client, prefix, cancel).await {
            Ok(entries) => {
                self.show(
                    BrowseState::NamespaceListed {
                        prefix: prefix.to_string(),
                    },
                    entries,
                );
                Ok(&self.entries)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Rebuilds the root listing, whatever is currently shown.
    pub async fn refresh(
        &mut self,
        client: Option<&dyn FerriteClient>,
        cancel: &CancellationToken,
    ) -> Result<&[KeyNode]> {
        self.list_root(client, cancel).await
    }

    /// Resets to the disconnected placeholder.
    pub fn show_disconnected(&mut self) {
        self.show(
            BrowseState::Disconnected,
            vec![placeholder(DISCONNECTED_PLACEHOLDER)],
        );
    }

    async fn load_namespace(
        &self,
        client: &dyn FerriteClient,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<KeyNode>> {
        let scan = scan_bounded(
            client,
            &prefix_pattern(prefix),
            self.settings.namespace_limit,
            self.settings.batch_size,
            cancel,
        )
        .await?;

        let mut entries = Vec::with_capacity(scan.keys.len() + 1);
        for key in &scan.keys {
            if cancel.is_cancelled() {
                return Err(LensError::Cancelled);
            }
            let key_type = client.key_type(key).await?;
            let ttl = client.ttl(key).await?;
            let label = key.strip_prefix(prefix).unwrap_or(key).to_string();
            entries.push(KeyNode::Key(
                KeyRecord::new(key.clone())
                    .with_label(label)
                    .with_metadata(key_type, ttl),
            ));
        }
        push_notice(&mut entries, &scan);

        Ok(entries)
    }

    fn show(&mut self, state: BrowseState, entries: Vec<KeyNode>) {
        self.state = state;
        self.entries = entries;
    }

    fn fail(&mut self, error: LensError) -> LensError {
        if !matches!(error, LensError::Cancelled) {
            warn!("Browsing failed: {}", error);
            self.show(
                BrowseState::Errored {
                    message: error.to_string(),
                },
                vec![placeholder(ERROR_PLACEHOLDER)],
            );
        }
        error
    }
}

impl Default for KeyBrowser {
    fn default() -> Self {
        Self::new(BrowserConfig::default())
    }
}

fn placeholder(message: &str) -> KeyNode {
    KeyNode::Placeholder {
        message: message.to_string(),
    }
}

/// Appends "Showing first N of M keys" when the scan was cut short.
fn push_notice(entries: &mut Vec<KeyNode>, scan: &ScanResult) {
    if let Some(notice) = scan.truncation_notice() {
        entries.push(placeholder(&notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FailingFerriteClient, MockFerriteClient, Ttl};
    use pretty_assertions::assert_eq;

    fn labels(entries: &[KeyNode]) -> Vec<String> {
        entries.iter().map(KeyNode::label).collect()
    }

    #[tokio::test]
    async fn test_disconnected_placeholder() {
        let mut browser = KeyBrowser::default();
        let entries = browser.list_root(None, &CancellationToken::new()).await.unwrap();
        assert_eq!(labels(entries), vec![DISCONNECTED_PLACEHOLDER]);
        assert_eq!(browser.state(), &BrowseState::Disconnected);
    }

    #[tokio::test]
    async fn test_root_then_namespace_then_refresh() {
        let client = MockFerriteClient::new()
            .with_hash("user:1", &[("name", "Alice")])
            .with_string("user:2", "Bob")
            .with_ttl("user:2", 90)
            .with_string("config", "x");
        let cancel = CancellationToken::new();
        let mut browser = KeyBrowser::default();

        let entries = browser.list_root(Some(&client), &cancel).await.unwrap();
        assert_eq!(labels(entries), vec!["user:  (2)", "config"]);
        assert_eq!(browser.state(), &BrowseState::RootListed);

        let entries = browser
            .expand_namespace(Some(&client), "user:", &cancel)
            .await
            .unwrap();
        assert_eq!(labels(entries), vec!["1  [hash, persistent]", "2  [string, 1m]"]);
        match &entries[1] {
            KeyNode::Key(record) => {
                assert_eq!(record.key, "user:2");
                assert_eq!(record.ttl, Some(Ttl::Seconds(90)));
            }
            other => panic!("expected key, got {other:?}"),
        }
        assert_eq!(
            browser.state(),
            &BrowseState::NamespaceListed {
                prefix: "user:".to_string()
            }
        );

        browser.refresh(Some(&client), &cancel).await.unwrap();
        assert_eq!(browser.state(), &BrowseState::RootListed);
    }

    #[tokio::test]
    async fn test_scan_error_shows_single_placeholder() {
        let client = FailingFerriteClient::default();
        let mut browser = KeyBrowser::default();

        let err = browser
            .list_root(Some(&client), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::Scan(_)));
        assert_eq!(labels(browser.entries()), vec![ERROR_PLACEHOLDER]);
        assert!(matches!(browser.state(), BrowseState::Errored { .. }));
    }

    #[tokio::test]
    async fn test_cancel_keeps_previous_listing() {
        let client = MockFerriteClient::new().with_keys(["a", "b"]);
        let mut browser = KeyBrowser::default();
        browser
            .list_root(Some(&client), &CancellationToken::new())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = browser.refresh(Some(&client), &cancel).await.unwrap_err();
        assert!(matches!(err, LensError::Cancelled));
        assert_eq!(browser.state(), &BrowseState::RootListed);
        assert_eq!(labels(browser.entries()), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_expand_escapes_glob_characters() {
        let client = MockFerriteClient::new().with_keys(["a*:1", "a*:2", "ab:1"]);
        let mut browser = KeyBrowser::default();
        let entries = browser
            .expand_namespace(Some(&client), "a*:", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_root_limit_bounds_listing() {
        let keys: Vec<String> = (0..50).map(|i| format!("k{i:02}")).collect();
        let client = MockFerriteClient::new().with_keys(keys);
        let mut browser = KeyBrowser::new(BrowserConfig {
            root_limit: 20,
            namespace_limit: 10,
            batch_size: 5,
        });

        let entries = browser
            .list_root(Some(&client), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(entries.len(), 21);
        assert_eq!(labels(&entries[20..]), vec!["Showing first 20 of 20+ keys"]);
        assert_eq!(client.scan_calls(), 4);
    }

    #[tokio::test]
    async fn test_truncated_listings_end_with_notice() {
        let keys: Vec<String> = (0..300).map(|i| format!("item:{i:03}")).collect();
        let client = MockFerriteClient::new().with_keys(keys);
        let cancel = CancellationToken::new();
        let mut browser = KeyBrowser::new(BrowserConfig {
            root_limit: 250,
            namespace_limit: 40,
            batch_size: 300,
        });

        let entries = browser.list_root(Some(&client), &cancel).await.unwrap();
        assert_eq!(
            labels(entries),
            vec!["item:  (250)", "Showing first 250 of 300 keys"]
        );

        let entries = browser
            .expand_namespace(Some(&client), "item:", &cancel)
            .await
            .unwrap();
        assert_eq!(entries.len(), 41);
        assert_eq!(labels(&entries[40..]), vec!["Showing first 40 of 300 keys"]);
    }

    #[tokio::test]
    async fn test_complete_listing_has_no_notice() {
        let client = MockFerriteClient::new().with_keys(["a", "b", "c"]);
        let mut browser = KeyBrowser::default();
        let entries = browser
            .list_root(Some(&client), &CancellationToken::new())
            .await
            .unwrap();
        assert!(entries
            .iter()
            .all(|entry| !matches!(entry, KeyNode::Placeholder { .. })));
    }
}
