//! `rostf` – inspect recorded `/tf` traffic from the command line.
//!
//! Replays a JSON-lines recording of `tf2_msgs/TFMessage`s into a
//! [`rostf_buffer::TransformBuffer`] configured from `~/.rostf/config.toml`
//! (or `--config <path>`), then answers one query:
//!
//! - `list` – every frame pair with its sample count and newest stamp.
//! - `latest <parent> <child>` – the most recent transform of a pair.
//! - `at <parent> <child> <secs>` – the transform closest to a time.
//! - `chain <from> <via> <to> [<secs>]` – `from → via` composed with `via → to`.
//! - `config [--init]` – show the effective buffer settings, or write the
//!   defaults.

mod args;
mod commands;
mod error;
mod replay;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use rostf_buffer::config;

use crate::args::Cli;
use crate::error::CliError;

fn main() -> ExitCode {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info").  ROSTF_LOG_FORMAT=json
    // switches to newline-delimited JSON.  Logs go to stderr so query output
    // on stdout stays pipeable.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ROSTF_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::config_path);
    let result = commands::execute(&cli.command, &config_path);

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(CliError::Usage(msg)) => {
            eprintln!("{}: {}", "usage error".red().bold(), msg);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
