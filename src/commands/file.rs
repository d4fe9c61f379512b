//! File catalog commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use aegis_core::config::AppConfig;
use aegis_core::error::AppError;
use aegis_core::types::{FileId, UserId};
use aegis_database::DatabasePool;
use aegis_entity::file::FileDescriptor;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct FileArgs {
    #[command(subcommand)]
    pub command: FileCommand,
}

#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Register a stored file so it can be shared
    Register {
        /// Owning user ID
        #[arg(long)]
        owner: UserId,
        /// Display filename
        #[arg(long)]
        name: String,
        /// MIME type
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
        /// Size of the plaintext in bytes
        #[arg(long)]
        size: i64,
    },
    /// List a user's files
    List {
        #[arg(long)]
        owner: UserId,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    id: String,
    filename: String,
    mime_type: String,
    size_bytes: i64,
    created_at: String,
}

impl From<&FileDescriptor> for FileRow {
    fn from(f: &FileDescriptor) -> Self {
        Self {
            id: f.id.to_string(),
            filename: f.filename.clone(),
            mime_type: f.mime_type.clone(),
            size_bytes: f.size_bytes,
            created_at: f.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub async fn execute(
    args: &FileArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    let files = db.stores().files;

    match &args.command {
        FileCommand::Register {
            owner,
            name,
            mime,
            size,
        } => {
            if name.trim().is_empty() || *size < 0 {
                return Err(AppError::validation(
                    "A file needs a name and a non-negative size",
                ));
            }
            let file = files
                .register(FileDescriptor {
                    id: FileId::new(),
                    owner_id: *owner,
                    filename: name.trim().to_string(),
                    mime_type: mime.clone(),
                    size_bytes: *size,
                    created_at: chrono::Utc::now(),
                })
                .await?;
            output::print_list(&[FileRow::from(&file)], format);
        }
        FileCommand::List { owner } => {
            let rows: Vec<FileRow> = files
                .list_by_owner(*owner)
                .await?
                .iter()
                .map(FileRow::from)
                .collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}
