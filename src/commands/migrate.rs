//! Database migration commands.

use clap::{Args, Subcommand};

use aegis_core::config::AppConfig;
use aegis_core::error::AppError;
use aegis_database::DatabasePool;
use aegis_database::migration::{migration_status, run_migrations};

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show migration status
    Status,
}

pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            run_migrations(db.pool()).await?;
            output::print_success("All migrations applied.");
        }
        MigrateCommand::Status => {
            for entry in migration_status(db.pool()).await? {
                let state = if entry.applied { "applied" } else { "pending" };
                println!("  {} {:<8} {}", entry.version, state, entry.description);
            }
        }
    }

    db.close().await;
    Ok(())
}
