//! Command execution integration tests.
//!
//! Drives the interactive shell and the executor against the in-memory client.

use ferrite_lens::client::{FailingFerriteClient, MockFerriteClient};
use ferrite_lens::commands::{CommandExecutor, OutputFormat};
use ferrite_lens::config::Config;
use ferrite_lens::connection::ConnectionManager;
use ferrite_lens::shell::{Shell, ShellOutput};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

async fn shell_with(client: MockFerriteClient, format: OutputFormat) -> Shell {
    let manager = ConnectionManager::with_connection(Box::new(client), Some("test".into())).await;
    let config = Config {
        output_format: format,
        ..Config::default()
    };
    Shell::new(manager, &config)
}

async fn run(shell: &mut Shell, line: &str) -> String {
    match shell.handle_line(line, &CancellationToken::new()).await {
        Ok(ShellOutput::Text(text)) => text,
        Ok(other) => panic!("expected text for {line:?}, got {other:?}"),
        Err(e) => panic!("{line:?} failed: {e}"),
    }
}

#[tokio::test]
async fn test_session_round_trip() {
    let mut shell = shell_with(MockFerriteClient::new(), OutputFormat::Raw).await;

    assert_eq!(run(&mut shell, "SET user:1 \"Ada Lovelace\"").await, "OK");
    assert_eq!(run(&mut shell, "get user:1").await, "Ada Lovelace");
    assert_eq!(run(&mut shell, "INCR visits").await, "1");
    assert_eq!(run(&mut shell, "GET nothing").await, "(nil)");

    assert_eq!(shell.manager().current_name(), Some("test"));
    assert_eq!(shell.manager().server_version(), Some("0.3.1"));
}

#[tokio::test]
async fn test_table_format_numbers_sequences() {
    let client = MockFerriteClient::new().with_list("queue", &["a", "b", "c"]);
    let mut shell = shell_with(client, OutputFormat::Table).await;

    assert_eq!(
        run(&mut shell, "LRANGE queue 0 -1").await,
        "1) \"a\"\n2) \"b\"\n3) \"c\""
    );
    assert_eq!(run(&mut shell, "GET missing").await, "(nil)");
}

#[tokio::test]
async fn test_server_errors_are_reported_verbatim() {
    let mut shell = shell_with(MockFerriteClient::new(), OutputFormat::Json).await;

    let err = shell
        .handle_line("NOSUCH thing", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ERR unknown command 'NOSUCH'"));

    run(&mut shell, "SET s x").await;
    let err = shell
        .handle_line("LPUSH s y", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("WRONGTYPE"));
}

#[tokio::test]
async fn test_inspect_renders_json_document() {
    let client = MockFerriteClient::new()
        .with_hash("user:1", &[("name", "Alice"), ("age", "30")])
        .with_ttl("user:1", 60)
        .with_zset("scores", &[("bob", 2.0), ("amy", 1.0)]);
    let mut shell = shell_with(client, OutputFormat::Json).await;

    let doc: serde_json::Value =
        serde_json::from_str(&run(&mut shell, "inspect user:1").await).unwrap();
    assert_eq!(doc["key"], "user:1");
    assert_eq!(doc["type"], "hash");
    assert_eq!(doc["ttl"], "60s");
    assert_eq!(doc["value"]["name"], "Alice");
    assert_eq!(doc["value"]["age"], "30");

    let doc: serde_json::Value =
        serde_json::from_str(&run(&mut shell, "inspect missing").await).unwrap();
    assert_eq!(doc["type"], "none");
    assert_eq!(doc["ttl"], "expired");
}

#[tokio::test]
async fn test_info_reports_all_sections() {
    let mut shell = shell_with(MockFerriteClient::new().with_keys(["a", "b"]), OutputFormat::Json).await;

    let report = run(&mut shell, "info").await;
    for heading in ["Server:", "Clients:", "Memory:", "Persistence:", "Stats:", "Keyspace:"] {
        assert!(report.contains(heading), "missing {heading} in {report}");
    }
    assert!(report.contains("1d 1h"));
}

#[tokio::test]
async fn test_script_runs_every_line() {
    let client = MockFerriteClient::new();
    let executor = CommandExecutor::new(&client, OutputFormat::Raw);
    let script = "\
# seed some data
SET a 1
SADD tags x y
BROKEN
// counters
INCR a
";

    let outcomes = executor.execute_script(script).await;
    let summary: Vec<_> = outcomes
        .iter()
        .map(|o| (o.line, o.result.as_ref().map(|e| e.output.clone()).ok()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (2, Some("OK".to_string())),
            (3, Some("2".to_string())),
            (4, None),
            (6, Some("2".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_server_fails_every_command() {
    let manager = ConnectionManager::with_connection(
        Box::new(FailingFerriteClient::new("Connection reset by peer")),
        None,
    )
    .await;
    let mut shell = Shell::new(manager, &Config::default());

    let err = shell
        .handle_line("PING", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_connection());
    assert!(err.to_string().contains("Connection reset by peer"));
}
