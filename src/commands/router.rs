//! Command routing for the interactive session.
//!
//! Separates session commands (`help`, `browse`, `inspect`, ...) from lines
//! that are sent to the server as-is.

use super::tokenizer::tokenize;

/// A parsed line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A command line to send to the server.
    Server(String),
    /// Show help, optionally for one server command.
    Help(Option<String>),
    /// List the keyspace root, optionally restricted to a pattern.
    Browse(Option<String>),
    /// List the keys of one namespace.
    Expand(String),
    /// Show type, TTL and value of a key.
    Inspect(String),
    /// Show server telemetry, optionally one section.
    Info(Option<String>),
    /// Change the output format, or show it when no argument is given.
    Format(Option<String>),
    /// Connect to a named connection or URL, or reconnect when none is given.
    Connect(Option<String>),
    /// Close the current connection.
    Disconnect,
    /// List the connections named in the config file.
    Connections,
    /// A server command that wipes data; runs only after confirmation.
    Destructive(String),
    /// Leave the session.
    Quit,
    /// A session command with missing arguments; carries its usage line.
    Usage(&'static str),
    /// Blank line or comment.
    Empty,
}

/// Server commands that need a confirmation before they are sent.
pub const DESTRUCTIVE_COMMANDS: &[&str] = &["FLUSHDB", "FLUSHALL"];

/// Parses interactive input into commands.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse user input into a Command.
    ///
    /// Session command names are matched case-insensitively; anything else is
    /// passed through for the server.
    pub fn parse(input: &str) -> Command {
        let input = input.trim();
        if input.is_empty() || input.starts_with('#') || input.starts_with("//") {
            return Command::Empty;
        }

        let tokens = tokenize(input);
        let Some(first) = tokens.first() else {
            return Command::Empty;
        };
        let arg = tokens.get(1).cloned();

        match first.to_lowercase().as_str() {
            "help" | "?" => Command::Help(arg),
            "browse" => Command::Browse(arg),
            "expand" => match arg {
                Some(prefix) => Command::Expand(prefix),
                None => Command::Usage("expand <prefix>"),
            },
            "inspect" => match arg {
                Some(key) => Command::Inspect(key),
                None => Command::Usage("inspect <key>"),
            },
            "info" => Command::Info(arg),
            "format" => Command::Format(arg),
            "connect" => Command::Connect(arg),
            "disconnect" => Command::Disconnect,
            "connections" => Command::Connections,
            "quit" | "exit" => Command::Quit,
            _ if is_destructive(first) => Command::Destructive(input.to_string()),
            _ => Command::Server(input.to_string()),
        }
    }
}

fn is_destructive(name: &str) -> bool {
    DESTRUCTIVE_COMMANDS
        .iter()
        .any(|cmd| cmd.eq_ignore_ascii_case(name))
}
