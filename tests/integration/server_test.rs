//! Live server integration tests.
//!
//! Require a running Ferrite (or protocol-compatible) server. Set FERRITE_URL
//! to run them; use a scratch database, since keys under `lens-test:` are
//! created and removed.

use ferrite_lens::client::{self, FerriteClient, KeyType, RemoteClient, Ttl};
use ferrite_lens::config::ConnectionConfig;
use ferrite_lens::info::{fetch_section, InfoSection};
use ferrite_lens::keyspace::{inspect_key, scan_keys, InspectedValue};
use tokio_util::sync::CancellationToken;

/// Helper to get test server URL from environment.
fn get_test_server_url() -> Option<String> {
    std::env::var("FERRITE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<Box<dyn FerriteClient>> {
    let url = get_test_server_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    client::connect(&config).await.ok()
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_connect_and_ping() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: FERRITE_URL not set");
        return;
    };

    let reply = client.call("PING", &[]).await.unwrap();
    assert_eq!(reply.to_raw_string(), "PONG");
    client.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_refused_port() {
    let config = ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        port: 1,
        ..Default::default()
    };

    let err = RemoteClient::connect(&config).await.err().unwrap();
    assert!(err.is_connection(), "Expected connection error, got: {err}");
}

#[tokio::test]
async fn test_scan_and_inspect_roundtrip() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: FERRITE_URL not set");
        return;
    };

    for i in 0..5 {
        let key = format!("lens-test:scan:{i}");
        client.call("SET", &args(&[&key, "v"])).await.unwrap();
    }
    client
        .call("HSET", &args(&["lens-test:hash", "field", "value"]))
        .await
        .unwrap();

    let keys = scan_keys(
        client.as_ref(),
        "lens-test:scan:*",
        100,
        2,
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(keys.len(), 5);

    let inspection = inspect_key(client.as_ref(), "lens-test:hash").await.unwrap();
    assert_eq!(inspection.key_type, KeyType::Hash);
    assert_eq!(inspection.ttl, Ttl::Persistent);
    assert!(matches!(inspection.value, InspectedValue::Fetched(_)));

    let mut cleanup = keys.clone();
    cleanup.push("lens-test:hash".to_string());
    client.call("DEL", &cleanup).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_info_sections() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: FERRITE_URL not set");
        return;
    };

    let fields = fetch_section(client.as_ref(), InfoSection::Memory)
        .await
        .unwrap();
    assert!(fields.iter().any(|f| f.key == "used_memory"));
    client.close().await.unwrap();
}
