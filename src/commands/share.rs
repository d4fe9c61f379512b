//! Share link commands.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use aegis_core::config::AppConfig;
use aegis_core::error::AppError;
use aegis_core::types::{FileId, ShareId, UserId};
use aegis_entity::access::AccessAttempt;
use aegis_entity::share::{ShareFilter, ShareRecord, UNLIMITED_DOWNLOADS};
use aegis_service::{
    CreateShareRequest, ProvidedFileKey, RequestContext, UpdateShareRequest,
};

use super::{Runtime, prompt_file_key, prompt_password};
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Owner identity for owner-side commands.
#[derive(Debug, Args)]
pub struct Actor {
    /// Acting user ID
    #[arg(long = "user")]
    pub user_id: UserId,
    /// Acting username
    #[arg(long, default_value = "cli")]
    pub username: String,
}

impl Actor {
    fn context(&self) -> RequestContext {
        RequestContext::new(
            self.user_id,
            self.username.clone(),
            "127.0.0.1",
            Some(format!("aegis-cli/{}", env!("CARGO_PKG_VERSION"))),
        )
    }
}

#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Create a password-protected share link (prompts for key and password)
    Create {
        #[command(flatten)]
        actor: Actor,
        /// File to share
        #[arg(long)]
        file: FileId,
        /// Download limit, -1 for unlimited
        #[arg(long, default_value_t = UNLIMITED_DOWNLOADS, allow_negative_numbers = true)]
        max_downloads: i32,
        /// Expire after this many hours
        #[arg(long, conflicts_with = "expires_at")]
        expires_in_hours: Option<i64>,
        /// Expire at this RFC 3339 timestamp
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
        /// Restrict access to this username (repeatable)
        #[arg(long = "allow")]
        allowed_usernames: Vec<String>,
    },
    /// Show public metadata for a share link or token
    Info {
        /// Share URL or bare token
        link: String,
    },
    /// Unwrap the FileKey behind a share link (prompts for password)
    Access {
        /// Share URL or bare token
        link: String,
        /// Identity to present for allow-listed shares
        #[arg(long = "as")]
        requester: Option<String>,
    },
    /// Change expiry, quota, allow-list, or password of a share
    Update {
        #[command(flatten)]
        actor: Actor,
        share: ShareId,
        #[arg(long, allow_negative_numbers = true)]
        max_downloads: Option<i32>,
        #[arg(long, conflicts_with = "no_expiry")]
        expires_at: Option<DateTime<Utc>>,
        /// Remove the expiry
        #[arg(long)]
        no_expiry: bool,
        /// Replace the allow-list (repeatable)
        #[arg(long = "allow", conflicts_with = "public")]
        allowed_usernames: Vec<String>,
        /// Remove the allow-list
        #[arg(long)]
        public: bool,
        /// Re-wrap under a new password (prompts for key and password)
        #[arg(long)]
        new_password: bool,
    },
    /// Revoke a share
    Revoke {
        #[command(flatten)]
        actor: Actor,
        share: ShareId,
    },
    /// List your shares
    List {
        #[command(flatten)]
        actor: Actor,
        /// all, active, expired, exhausted, revoked, or a file ID
        #[arg(long, default_value = "all")]
        filter: ShareFilter,
    },
    /// Access statistics for a share
    Stats {
        #[command(flatten)]
        actor: Actor,
        share: ShareId,
    },
    /// Delete access log entries older than the given number of days
    PurgeLogs {
        #[arg(long, default_value_t = 90)]
        older_than_days: i64,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct ShareRow {
    id: String,
    file_id: String,
    token: String,
    status: String,
    downloads: String,
    expires_at: String,
    restricted: bool,
}

impl ShareRow {
    fn new(record: &ShareRecord, now: DateTime<Utc>) -> Self {
        let limit = if record.is_unlimited() {
            "∞".to_string()
        } else {
            record.max_downloads.to_string()
        };
        Self {
            id: record.id.to_string(),
            file_id: record.file_id.to_string(),
            token: format!("{}…", record.token_prefix()),
            status: record.status(now).to_string(),
            downloads: format!("{}/{limit}", record.download_count),
            expires_at: record
                .expires_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
            restricted: record.is_restricted(),
        }
    }
}

pub async fn execute(
    args: &ShareArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let rt = Runtime::connect(config).await?;

    match &args.command {
        ShareCommand::Create {
            actor,
            file,
            max_downloads,
            expires_in_hours,
            expires_at,
            allowed_usernames,
        } => {
            let ctx = actor.context();
            let expires_at = expires_in_hours
                .map(|h| ctx.request_time + Duration::hours(h))
                .or(*expires_at);

            let keys = Arc::new(ProvidedFileKey::for_file(*file, prompt_file_key()?));
            let password = prompt_password("Share password", true)?;

            let record = rt
                .share_service(keys)
                .create_share(
                    &ctx,
                    CreateShareRequest {
                        file_id: *file,
                        password,
                        max_downloads: *max_downloads,
                        expires_at,
                        allowed_usernames: Some(allowed_usernames.clone()),
                    },
                )
                .await?;
            let link = rt.links.generate_share_link(&record)?;
            output::print_item(
                &link,
                &[
                    ("Share ID", link.share_id.to_string()),
                    ("Link", link.url.clone()),
                ],
                format,
            );
        }
        ShareCommand::Info { link } => {
            let token = rt.links.resolve_token(link)?;
            let meta = rt
                .access_service()
                .get_share_metadata(&token, &cli_attempt())
                .await?;
            let remaining = if meta.remaining_downloads == UNLIMITED_DOWNLOADS {
                "unlimited".to_string()
            } else {
                meta.remaining_downloads.to_string()
            };
            output::print_item(
                &meta,
                &[
                    ("Filename", meta.filename.clone()),
                    ("MIME type", meta.mime_type.clone()),
                    ("Size", format!("{} bytes", meta.size_bytes)),
                    ("Downloads", meta.download_count.to_string()),
                    ("Remaining", remaining),
                    ("Status", meta.status.to_string()),
                ],
                format,
            );
        }
        ShareCommand::Access { link, requester } => {
            rt.require_shared_counters()?;
            let token = rt.links.resolve_token(link)?;
            let password = zeroize::Zeroizing::new(prompt_password("Share password", false)?);
            let attempt = cli_attempt();
            let grant = rt
                .access_service()
                .access_shared_file(&token, &password, requester.as_deref(), &attempt)
                .await?;
            output::print_kv("File key", &grant.file_key.to_hex());
            output::print_kv("Downloads used", &grant.download_count.to_string());
        }
        ShareCommand::Update {
            actor,
            share,
            max_downloads,
            expires_at,
            no_expiry,
            allowed_usernames,
            public,
            new_password,
        } => {
            let ctx = actor.context();
            let service = if *new_password {
                let current = rt.share_service(no_key()).get_share(&ctx, *share).await?;
                rt.share_service(Arc::new(ProvidedFileKey::for_file(
                    current.file_id,
                    prompt_file_key()?,
                )))
            } else {
                rt.share_service(no_key())
            };
            let password = if *new_password {
                Some(prompt_password("New share password", true)?)
            } else {
                None
            };

            let req = UpdateShareRequest {
                expires_at: if *no_expiry {
                    Some(None)
                } else {
                    expires_at.map(Some)
                },
                max_downloads: *max_downloads,
                password,
                allowed_usernames: if *public {
                    Some(Vec::new())
                } else if allowed_usernames.is_empty() {
                    None
                } else {
                    Some(allowed_usernames.clone())
                },
            };
            let record = service.update_share(&ctx, *share, req).await?;
            output::print_list(&[ShareRow::new(&record, Utc::now())], format);
        }
        ShareCommand::Revoke { actor, share } => {
            let revoked = rt
                .share_service(no_key())
                .revoke_share(&actor.context(), *share)
                .await?;
            if revoked {
                output::print_success("Share revoked.");
            } else {
                output::print_warning("Share was already revoked.");
            }
        }
        ShareCommand::List { actor, filter } => {
            let now = Utc::now();
            let rows: Vec<ShareRow> = rt
                .share_service(no_key())
                .list_shares(&actor.context(), filter)
                .await?
                .iter()
                .map(|r| ShareRow::new(r, now))
                .collect();
            output::print_list(&rows, format);
        }
        ShareCommand::Stats { actor, share } => {
            let stats = rt
                .access_service()
                .access_stats(actor.user_id, *share)
                .await?;
            output::print_item(
                &stats,
                &[
                    ("Total attempts", stats.total_attempts.to_string()),
                    ("Successful", stats.successful_attempts.to_string()),
                    ("Failed", stats.failed_attempts.to_string()),
                    ("Last 24h", stats.recent_attempts.to_string()),
                    ("Unique IPs", stats.unique_ips.to_string()),
                ],
                format,
            );
        }
        ShareCommand::PurgeLogs { older_than_days } => {
            let cutoff = Utc::now() - Duration::days((*older_than_days).max(0));
            let removed = rt.access_service().purge_access_logs(cutoff).await?;
            output::print_success(&format!("Removed {removed} access log entries."));
        }
    }
    Ok(())
}

/// The CLI acts as a local client.
fn cli_attempt() -> AccessAttempt {
    AccessAttempt::new(
        "127.0.0.1",
        format!("aegis-cli/{}", env!("CARGO_PKG_VERSION")),
    )
}

/// Key source for commands that never re-wrap.
fn no_key() -> Arc<NoFileKey> {
    Arc::new(NoFileKey)
}

#[derive(Debug)]
struct NoFileKey;

#[async_trait::async_trait]
impl aegis_service::FileKeySource for NoFileKey {
    async fn file_key(
        &self,
        _owner_id: UserId,
        _file: &aegis_entity::file::FileDescriptor,
    ) -> Result<aegis_crypto::FileKey, AppError> {
        Err(AppError::validation("This command does not accept a file key"))
    }
}
