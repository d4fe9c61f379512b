//! Client-side key utilities.

use clap::{Args, Subcommand};
use serde::Serialize;

use aegis_core::config::AppConfig;
use aegis_core::error::AppError;
use aegis_crypto::FileKey;
use aegis_service::LinkService;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    /// Generate a new random FileKey and print it once
    Generate,
}

#[derive(Serialize)]
struct GeneratedKey<'a> {
    file_key: &'a str,
}

pub fn execute(args: &KeyArgs, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        KeyCommand::Generate => {
            let key = FileKey::generate()?;
            let hex = key.to_hex();
            output::print_item(
                &GeneratedKey { file_key: &hex },
                &[("File key", hex.to_string())],
                format,
            );
            output::print_warning("Store this key yourself. It is not saved anywhere.");
        }
    }
    Ok(())
}

pub fn print_token(config: &AppConfig) -> Result<(), AppError> {
    let token = LinkService::new(config.server.base_url.clone()).generate_secure_token()?;
    println!("{token}");
    Ok(())
}
