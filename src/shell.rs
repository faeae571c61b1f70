//! Interactive session driver.
//!
//! Owns the connection manager and the browse session, and turns routed
//! commands into text for the terminal. The binary's REPL and one-shot modes
//! both go through here.
//!
//! Commands that wipe data are held back until the next line answers the
//! confirmation question.

use crate::commands::definitions::{complete, describe, find_command, generate_help_text};
use crate::commands::{Command, CommandExecutor, CommandRouter, OutputFormat};
use crate::client::FerriteClient;
use crate::config::{Config, ConnectionConfig};
use crate::connection::ConnectionManager;
use crate::error::{LensError, Result};
use crate::info::{fetch_section, render_report, InfoSection};
use crate::keyspace::{inspect_key, KeyBrowser, KeyNode};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of handling one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutput {
    /// Text to print.
    Text(String),
    /// The session should end.
    Exit,
    /// Nothing to print.
    None,
    /// A question to answer on the next line before the command runs.
    Confirm(String),
}

/// An interactive session against one server.
pub struct Shell {
    manager: ConnectionManager,
    browser: KeyBrowser,
    format: OutputFormat,
    /// Named connections from the config file.
    connections: HashMap<String, ConnectionConfig>,
    /// Where `connect` without an argument goes.
    target: ConnectionConfig,
    target_name: Option<String>,
    /// Destructive command line waiting for confirmation.
    pending: Option<String>,
}

impl Shell {
    /// Creates a shell using the browse limits, output format and named
    /// connections from `config`.
    pub fn new(manager: ConnectionManager, config: &Config) -> Self {
        Self {
            manager,
            browser: KeyBrowser::new(config.browser),
            format: config.output_format,
            connections: config.connections.clone(),
            target: ConnectionConfig::default(),
            target_name: None,
            pending: None,
        }
    }

    /// Sets the connection that `connect` without an argument reopens.
    pub fn with_target(mut self, connection: ConnectionConfig, name: Option<String>) -> Self {
        self.target = connection;
        self.target_name = name;
        self
    }

    /// The current or most recent connection target.
    pub fn target(&self) -> &ConnectionConfig {
        &self.target
    }

    /// Whether the next line answers a confirmation question.
    pub fn awaiting_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn browser(&self) -> &KeyBrowser {
        &self.browser
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Parses and handles one line of input.
    ///
    /// While a confirmation is pending the line is taken as the answer:
    /// `y` or `yes` runs the held command, anything else drops it.
    pub async fn handle_line(&mut self, line: &str, cancel: &CancellationToken) -> Result<ShellOutput> {
        if let Some(pending) = self.pending.take() {
            return self.answer(&pending, line).await.map(ShellOutput::Text);
        }
        self.handle(CommandRouter::parse(line), cancel).await
    }

    /// Handles a routed command.
    pub async fn handle(&mut self, command: Command, cancel: &CancellationToken) -> Result<ShellOutput> {
        debug!("Handling {:?}", command);

        let text = match command {
            Command::Empty => return Ok(ShellOutput::None),
            Command::Quit => return Ok(ShellOutput::Exit),
            Command::Usage(usage) => return Err(LensError::command(format!("Usage: {usage}"))),
            Command::Help(topic) => help(topic.as_deref()),
            Command::Format(mode) => self.change_format(mode.as_deref()),
            Command::Server(line) => self.execute(&line).await?,
            Command::Browse(pattern) => self.browse(pattern.as_deref(), cancel).await?,
            Command::Expand(prefix) => self.expand(&prefix, cancel).await?,
            Command::Inspect(key) => self.inspect(&key).await?,
            Command::Info(section) => self.info(section.as_deref()).await?,
            Command::Connect(target) => self.connect(target.as_deref(), cancel).await?,
            Command::Disconnect => self.disconnect().await,
            Command::Connections => self.list_connections(),
            Command::Destructive(line) => {
                self.manager.require_client()?;
                let question = confirmation_question(&line);
                self.pending = Some(line);
                return Ok(ShellOutput::Confirm(question));
            }
        };

        Ok(ShellOutput::Text(text))
    }

    /// Executes a server command line and returns the formatted reply.
    pub async fn execute(&self, line: &str) -> Result<String> {
        let client = self.manager.require_client()?;
        let executor = CommandExecutor::new(client, self.format);
        Ok(executor
            .execute_line(line)
            .await?
            .map(|execution| execution.output)
            .unwrap_or_default())
    }

    /// Lists the keyspace root, or the keys matching `pattern`.
    pub async fn browse(&mut self, pattern: Option<&str>, cancel: &CancellationToken) -> Result<String> {
        let client = self.manager.client();
        let entries = match pattern {
            Some(pattern) => self.browser.list_root_matching(client, pattern, cancel).await?,
            None => self.browser.list_root(client, cancel).await?,
        };
        Ok(render_listing(entries))
    }

    /// Lists the keys under `prefix` with type and TTL.
    pub async fn expand(&mut self, prefix: &str, cancel: &CancellationToken) -> Result<String> {
        let client = self.manager.client();
        let entries = self.browser.expand_namespace(client, prefix, cancel).await?;
        Ok(render_listing(entries))
    }

    /// Renders a key's type, TTL and value as JSON.
    pub async fn inspect(&self, key: &str) -> Result<String> {
        let client = self.manager.require_client()?;
        Ok(inspect_key(client, key).await?.to_json())
    }

    /// Renders telemetry for one section, or all of them.
    pub async fn info(&self, section: Option<&str>) -> Result<String> {
        let client = self.manager.require_client()?;

        let sections = match section {
            None => InfoSection::ALL.to_vec(),
            Some(s) if s.eq_ignore_ascii_case("all") => InfoSection::ALL.to_vec(),
            Some(s) => vec![s.parse::<InfoSection>().map_err(LensError::command)?],
        };

        let mut report = Vec::with_capacity(sections.len());
        for section in sections {
            report.push((section, fetch_section(client, section).await?));
        }
        Ok(render_report(&report))
    }

    /// Connects to a named connection, a URL, or the last target, then lists
    /// the keyspace root of the new server.
    pub async fn connect(&mut self, target: Option<&str>, cancel: &CancellationToken) -> Result<String> {
        let (connection, name) = self.resolve_target(target)?;
        let client = crate::client::connect(&connection).await?;
        self.attach(client, connection, name, cancel).await
    }

    /// Installs `client` as the session's connection and lists the root.
    ///
    /// A failed listing is reported below the connection line; the
    /// connection itself stays open.
    pub async fn attach(
        &mut self,
        client: Box<dyn FerriteClient>,
        connection: ConnectionConfig,
        name: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.manager.replace(client, name.clone()).await;
        self.target = connection;
        self.target_name = name;
        self.pending = None;

        let header = format!(
            "Connected to {} (server {})",
            self.target.display_string(),
            self.manager.server_version().unwrap_or("unknown")
        );
        match self.browse(None, cancel).await {
            Ok(listing) => Ok(format!("{header}\n{listing}")),
            Err(e) => {
                warn!("Listing after connect failed: {}", e);
                Ok(format!("{header}\n{e}"))
            }
        }
    }

    /// Closes the connection and resets the browser.
    pub async fn disconnect(&mut self) -> String {
        if !self.manager.is_connected() {
            return "Not connected".to_string();
        }
        self.manager.disconnect().await;
        self.browser.show_disconnected();
        self.pending = None;
        info!("Disconnected from {}", self.target.display_string());
        format!("Disconnected from {}", self.target.display_string())
    }

    /// Closes the connection.
    pub async fn close(mut self) {
        self.manager.disconnect().await;
    }

    fn resolve_target(&self, target: Option<&str>) -> Result<(ConnectionConfig, Option<String>)> {
        let (mut connection, name) = match target {
            None => (self.target.clone(), self.target_name.clone()),
            Some(url) if url.contains("://") => (ConnectionConfig::from_connection_string(url)?, None),
            Some(name) => {
                let connection = self.connections.get(name).cloned().ok_or_else(|| {
                    LensError::config(format!("Connection '{name}' not found in config file"))
                })?;
                (connection, Some(name.to_string()))
            }
        };
        connection.apply_env_defaults();
        Ok((connection, name))
    }

    fn list_connections(&self) -> String {
        if self.connections.is_empty() {
            return "No connections in config file".to_string();
        }

        let mut names: Vec<_> = self.connections.keys().collect();
        names.sort();
        let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
        let current = self
            .manager
            .is_connected()
            .then(|| self.manager.current_name())
            .flatten();

        names
            .into_iter()
            .map(|name| {
                let marker = if current == Some(name.as_str()) { '*' } else { ' ' };
                format!(
                    "{marker} {name:<width$}  {}",
                    self.connections[name].display_string()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn answer(&mut self, line: &str, reply: &str) -> Result<String> {
        let reply = reply.trim();
        if !(reply.eq_ignore_ascii_case("y") || reply.eq_ignore_ascii_case("yes")) {
            return Ok("Cancelled".to_string());
        }

        let output = self.execute(line).await?;
        let name = first_word(line);
        Ok(if name.eq_ignore_ascii_case("FLUSHDB") {
            "Database flushed successfully".to_string()
        } else if name.eq_ignore_ascii_case("FLUSHALL") {
            "All databases flushed successfully".to_string()
        } else {
            output
        })
    }

    fn change_format(&mut self, mode: Option<&str>) -> String {
        match mode {
            None => format!("Output format: {}", self.format),
            Some(mode) => {
                self.format = OutputFormat::parse_lenient(mode);
                format!("Output format set to {}", self.format)
            }
        }
    }
}

fn help(topic: Option<&str>) -> String {
    let Some(topic) = topic else {
        return generate_help_text();
    };

    if let Some(cmd) = find_command(topic) {
        return describe(cmd);
    }

    let candidates: Vec<_> = complete(topic).map(|c| c.name).collect();
    if candidates.is_empty() {
        format!("Unknown command: {topic}. Type help for available commands.")
    } else {
        format!("Unknown command: {topic}. Did you mean: {}?", candidates.join(", "))
    }
}

fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or_default()
}

fn confirmation_question(line: &str) -> String {
    if first_word(line).eq_ignore_ascii_case("FLUSHALL") {
        "Are you sure you want to flush every database? This cannot be undone.".to_string()
    } else {
        "Are you sure you want to flush the current database? This cannot be undone.".to_string()
    }
}

/// One entry per line.
pub fn render_listing(entries: &[KeyNode]) -> String {
    entries
        .iter()
        .map(KeyNode::label)
        .collect::<Vec<_>>()
        .join("\n")
}
