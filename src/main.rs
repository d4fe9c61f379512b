//! Aegis share CLI.
//!
//! Wires configuration, logging, the database, the cache, and the share
//! services together behind a small set of operator commands.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use aegis_core::config::{LogFormat, LoggingConfig};

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match aegis_core::config::AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.execute(config).await {
        if e.kind.is_internal() {
            tracing::error!(error = %e, source = ?e.source, "Command failed");
        } else {
            tracing::debug!(error = %e, "Command failed");
        }
        output::print_error(e.public_message());
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(config.ansi)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
