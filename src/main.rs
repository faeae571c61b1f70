//! ferrite-lens - A lightweight terminal client for Ferrite servers.

use ferrite_lens::cli::{Cli, Mode};
use ferrite_lens::commands::CommandExecutor;
use ferrite_lens::config::{Config, ConnectionConfig};
use ferrite_lens::connection::ConnectionManager;
use ferrite_lens::error::{LensError, Result};
use ferrite_lens::logging;
use ferrite_lens::shell::{Shell, ShellOutput};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    let log_to_file = cli.log_file;
    if log_to_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        if log_to_file {
            error!("{}", e);
        }
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    cli.validate().map_err(LensError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.output_format = cli.output_format(config.output_format);

    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let connection = resolve_connection(&cli, &config)?;
    info!("Connection: {}", connection.display_string());

    let mode = cli.mode();
    let name = cli.connection_name().map(String::from);
    let mut manager = ConnectionManager::new();

    match manager.connect(&connection, name.clone()).await {
        Ok(()) => {}
        Err(e) if mode == Mode::Repl => {
            warn!("Starting disconnected: {}", e);
            eprintln!("{e}");
        }
        Err(e) => return Err(e),
    }

    let mut shell = Shell::new(manager, &config).with_target(connection, name);
    let result = run_mode(&mut shell, mode).await;
    shell.close().await;
    result
}

async fn run_mode(shell: &mut Shell, mode: Mode) -> Result<()> {
    let cancel = CancellationToken::new();

    match mode {
        Mode::Command(tokens) => {
            let executor = CommandExecutor::new(shell.manager().require_client()?, shell.format());
            if let Some(execution) = executor.execute_tokens(&tokens).await? {
                println!("{}", execution.output);
            }
        }
        Mode::Eval(lines) => {
            for line in lines {
                match shell.handle_line(&line, &cancel).await? {
                    ShellOutput::Confirm(_) => {
                        return Err(LensError::command(format!(
                            "'{line}' needs confirmation; run it in the interactive session \
                             or pass it as COMMAND"
                        )))
                    }
                    output => print_output(output),
                }
            }
        }
        Mode::Script(path) => run_script(shell, &path).await?,
        Mode::Browse(pattern) => {
            let pattern = (pattern != "*").then_some(pattern.as_str());
            println!("{}", with_interrupt(shell.browse(pattern, &cancel), &cancel).await?);
        }
        Mode::Expand(prefix) => {
            println!("{}", with_interrupt(shell.expand(&prefix, &cancel), &cancel).await?);
        }
        Mode::Inspect(key) => println!("{}", shell.inspect(&key).await?),
        Mode::Info { section, watch } => match watch {
            Some(secs) => watch_info(shell, &section, secs).await?,
            None => println!("{}", shell.info(Some(&section)).await?),
        },
        Mode::Repl => repl(shell).await?,
    }

    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<ConnectionConfig> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(LensError::config(format!(
                    "Connection '{name}' not found in config file"
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    let mut connection = connection.unwrap_or_default();
    connection.apply_env_defaults();
    Ok(connection)
}

/// Runs a script file (or stdin for `-`), reporting each line.
///
/// Every line is attempted; the run fails afterwards if any line failed.
async fn run_script(shell: &Shell, path: &str) -> Result<()> {
    let script = if path == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .map_err(|e| LensError::command(format!("Failed to read script from stdin: {e}")))?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LensError::command(format!("Failed to read script {path}: {e}")))?
    };

    let executor = CommandExecutor::new(shell.manager().require_client()?, shell.format());
    let outcomes = executor.execute_script(&script).await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(execution) => println!("{}", execution.output),
            Err(e) => {
                failed += 1;
                eprintln!("line {}: {}: {}", outcome.line, outcome.text, e);
            }
        }
    }

    if failed > 0 {
        return Err(LensError::command(format!(
            "{failed} of {} script lines failed",
            outcomes.len()
        )));
    }
    Ok(())
}

/// Prints telemetry every `secs` seconds until Ctrl-C.
///
/// The first report must succeed; later failures other than a lost
/// connection are printed and the next tick tries again.
async fn watch_info(shell: &Shell, section: &str, secs: u64) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    interval.tick().await;
    println!("{}\n", shell.info(Some(section)).await?);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match shell.info(Some(section)).await {
                    Ok(report) => println!("{report}\n"),
                    Err(e) if e.is_connection() => return Err(e),
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Watch interrupted");
                return Ok(());
            }
        }
    }
}

/// Runs `fut`, cancelling `cancel` when Ctrl-C arrives.
async fn with_interrupt<T>(
    fut: impl std::future::Future<Output = Result<T>>,
    cancel: &CancellationToken,
) -> Result<T> {
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = fut.await;
    watcher.abort();
    result
}

async fn repl(shell: &mut Shell) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!(
        "ferrite-lens {} (server {})",
        env!("CARGO_PKG_VERSION"),
        shell.manager().server_version().unwrap_or("not connected")
    );
    println!("Type help for commands, quit to leave.");

    loop {
        let prompt = if shell.awaiting_confirmation() {
            "Proceed? [y/N] ".to_string()
        } else if shell.manager().is_connected() {
            format!("{}> ", shell.target().display_string())
        } else {
            "ferrite> ".to_string()
        };
        write_prompt(&mut stdout, &prompt).await;

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        };

        // A fresh token per line, so an interrupted scan doesn't poison the next one.
        let cancel = CancellationToken::new();
        match with_interrupt(shell.handle_line(&line, &cancel), &cancel).await {
            Ok(ShellOutput::Exit) => break,
            Ok(output) => print_output(output),
            Err(e) => eprintln!("{e}"),
        }
    }

    Ok(())
}

async fn write_prompt(stdout: &mut tokio::io::Stdout, prompt: &str) {
    if stdout.write_all(prompt.as_bytes()).await.is_ok() {
        let _ = stdout.flush().await;
    }
}

fn print_output(output: ShellOutput) {
    match output {
        ShellOutput::Text(text) | ShellOutput::Confirm(text) if !text.is_empty() => {
            println!("{text}")
        }
        _ => {}
    }
}
