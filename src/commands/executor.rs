//! Ad-hoc command execution.
//!
//! Turns a raw command line into a server call and a formatted reply.
//! Failed commands are reported as they came back and never retried.

use super::format::{format_reply, OutputFormat};
use super::tokenizer::{split_command, tokenize};
use crate::client::{FerriteClient, Reply};
use crate::error::Result;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of one executed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Upper-cased command name.
    pub command: String,
    pub args: Vec<String>,
    pub reply: Reply,
    /// Reply rendered with the executor's output format.
    pub output: String,
    pub duration: Duration,
}

/// Outcome of one line of a script.
#[derive(Debug)]
pub struct LineOutcome {
    /// 1-based line number in the script.
    pub line: usize,
    pub text: String,
    pub result: Result<Execution>,
}

/// Executes command lines against a client.
pub struct CommandExecutor<'a> {
    client: &'a dyn FerriteClient,
    format: OutputFormat,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(client: &'a dyn FerriteClient, format: OutputFormat) -> Self {
        Self { client, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Executes a single line.
    ///
    /// Blank lines and comments (`#` or `//`) are skipped and yield `Ok(None)`.
    pub async fn execute_line(&self, line: &str) -> Result<Option<Execution>> {
        let line = line.trim();
        if is_skippable(line) {
            return Ok(None);
        }

        self.execute_tokens(&tokenize(line)).await
    }

    /// Executes an already tokenized command, name first.
    ///
    /// An empty token list yields `Ok(None)`.
    pub async fn execute_tokens(&self, tokens: &[String]) -> Result<Option<Execution>> {
        let Some((command, args)) = split_command(tokens) else {
            return Ok(None);
        };

        let start = Instant::now();
        let reply = self.client.call(&command, args).await?;
        let duration = start.elapsed();
        debug!("{} completed in {:?}", command, duration);

        Ok(Some(Execution {
            output: format_reply(&reply, self.format),
            command,
            args: args.to_vec(),
            reply,
            duration,
        }))
    }

    /// Executes every line of `script` in order.
    ///
    /// A failing line does not stop the script; each executed line gets an
    /// outcome. Skipped lines get none.
    pub async fn execute_script(&self, script: &str) -> Vec<LineOutcome> {
        let mut outcomes = Vec::new();

        for (index, text) in script.lines().enumerate() {
            let result = match self.execute_line(text).await {
                Ok(Some(execution)) => Ok(execution),
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            outcomes.push(LineOutcome {
                line: index + 1,
                text: text.trim().to_string(),
                result,
            });
        }

        outcomes
    }
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with("//")
}
