//! Keyspace browsing integration tests.
//!
//! Exercises scanning, grouping and namespace expansion end to end against
//! the in-memory client.

use ferrite_lens::client::{KeyType, MockFerriteClient, Ttl};
use ferrite_lens::config::BrowserConfig;
use ferrite_lens::error::LensError;
use ferrite_lens::keyspace::{scan_keys, BrowseState, KeyBrowser, KeyNode};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn numbered_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("item:{i:04}")).collect()
}

#[tokio::test]
async fn test_scan_stops_at_limit_across_batches() {
    let client = MockFerriteClient::new().with_keys(numbered_keys(300));
    let cancel = CancellationToken::new();

    let keys = scan_keys(&client, "*", 250, 100, &cancel).await.unwrap();

    assert_eq!(keys.len(), 250);
    assert_eq!(client.scan_calls(), 3);
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[tokio::test]
async fn test_scan_exhausts_small_keyspace() {
    let client = MockFerriteClient::new().with_keys(numbered_keys(42));
    let keys = scan_keys(&client, "*", 500, 100, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(keys.len(), 42);
    assert_eq!(client.scan_calls(), 1);
}

#[tokio::test]
async fn test_root_listing_groups_namespaces() {
    let client =
        MockFerriteClient::new().with_keys(["user:1", "user:2", "session:abc", "config"]);
    let mut browser = KeyBrowser::default();

    let entries = browser
        .list_root(Some(&client), &CancellationToken::new())
        .await
        .unwrap();

    let labels: Vec<_> = entries.iter().map(KeyNode::label).collect();
    assert_eq!(labels, vec!["user:  (2)", "config", "session:abc"]);
    assert_eq!(browser.state(), &BrowseState::RootListed);
}

#[tokio::test]
async fn test_root_listing_respects_configured_limit() {
    let client = MockFerriteClient::new().with_keys(numbered_keys(300));
    let mut browser = KeyBrowser::new(BrowserConfig {
        root_limit: 250,
        namespace_limit: 200,
        batch_size: 100,
    });

    let entries = browser
        .list_root(Some(&client), &CancellationToken::new())
        .await
        .unwrap();

    match &entries[0] {
        KeyNode::Namespace(group) => {
            assert_eq!(group.prefix, "item:");
            assert_eq!(group.len(), 250);
        }
        other => panic!("expected namespace, got {other:?}"),
    }
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].label(), "Showing first 250 of 300 keys");
}

#[tokio::test]
async fn test_expand_namespace_fetches_metadata() {
    let client = MockFerriteClient::new()
        .with_hash("user:1", &[("name", "ada")])
        .with_string("user:2", "x")
        .with_ttl("user:2", 300)
        .with_string("other", "y");
    let mut browser = KeyBrowser::default();

    let entries = browser
        .expand_namespace(Some(&client), "user:", &CancellationToken::new())
        .await
        .unwrap();

    let records: Vec<_> = entries
        .iter()
        .map(|node| match node {
            KeyNode::Key(record) => record.clone(),
            other => panic!("expected key, got {other:?}"),
        })
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, "user:1");
    assert_eq!(records[0].label, "1");
    assert_eq!(records[0].key_type, Some(KeyType::Hash));
    assert_eq!(records[0].ttl, Some(Ttl::Persistent));
    assert_eq!(records[1].key, "user:2");
    assert_eq!(records[1].ttl, Some(Ttl::Seconds(300)));
}

#[tokio::test]
async fn test_failed_scan_shows_error_placeholder() {
    let client = MockFerriteClient::new()
        .with_keys(numbered_keys(300))
        .fail_scan_at(2);
    let mut browser = KeyBrowser::default();

    let err = browser
        .list_root(Some(&client), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Scan Error");
    assert!(matches!(browser.state(), BrowseState::Errored { .. }));
    assert_eq!(browser.entries()[0].label(), "Error loading keys");
}

#[tokio::test]
async fn test_cancelled_scan_keeps_previous_listing() {
    let client = MockFerriteClient::new().with_keys(["a:1", "a:2"]);
    let mut browser = KeyBrowser::default();
    browser
        .list_root(Some(&client), &CancellationToken::new())
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = browser.list_root(Some(&client), &cancel).await.unwrap_err();

    assert!(matches!(err, LensError::Cancelled));
    assert_eq!(browser.state(), &BrowseState::RootListed);
    assert_eq!(browser.entries()[0].label(), "a:  (2)");
}

#[tokio::test]
async fn test_disconnected_placeholder() {
    let mut browser = KeyBrowser::default();
    let entries = browser
        .list_root(None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label(), "Connect to browse keys");
    assert_eq!(browser.state(), &BrowseState::Disconnected);
}
