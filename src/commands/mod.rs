//! CLI command definitions and dispatch.

pub mod file;
pub mod key;
pub mod migrate;
pub mod share;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Password;

use aegis_auth::limiter::{AttemptLimiter, build_limiter};
use aegis_auth::throttle::RequestThrottle;
use aegis_auth::{CatalogOwnershipChecker, SharePasswordPolicy};
use aegis_cache::CacheManager;
use aegis_core::config::AppConfig;
use aegis_core::error::AppError;
use aegis_crypto::{EnvelopeCodec, FileKey};
use aegis_database::DatabasePool;
use aegis_database::connection::PgStores;
use aegis_service::{AccessService, FileKeySource, LinkService, ShareService};

use crate::output::OutputFormat;

/// Aegis: envelope-encrypted, password-protected file share links
#[derive(Debug, Parser)]
#[command(name = "aegis", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// File key utilities
    Key(key::KeyArgs),
    /// Print a fresh share-grade random token
    Token,
    /// File catalog management
    File(file::FileArgs),
    /// Share link management and access
    Share(share::ShareArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Key(args) => key::execute(args, self.format),
            Commands::Token => key::print_token(&config),
            Commands::File(args) => file::execute(args, &config, self.format).await,
            Commands::Share(args) => share::execute(args, &config, self.format).await,
        }
    }
}

/// Database stores plus the collaborators every share command needs.
pub struct Runtime {
    pub config: AppConfig,
    pub stores: PgStores,
    pub links: Arc<LinkService>,
    pub limiter: Arc<dyn AttemptLimiter>,
    pub throttle: RequestThrottle,
}

impl Runtime {
    /// Connect to the database and the cache.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let db = DatabasePool::connect(&config.database).await?;

        let manager = CacheManager::new(&config.cache).await?;
        if !manager.health_check().await? {
            tracing::warn!(provider = %config.cache.provider, "Cache health check failed");
        }
        if !config.has_shared_counters() {
            tracing::warn!(
                limiter = %config.limiter.backend,
                cache = %config.cache.provider,
                "Attempt and request counters are local to this process"
            );
        }
        let cache = manager.provider();
        let limiter = build_limiter(&config.limiter, Some(cache.clone()))?;
        let throttle = RequestThrottle::new(cache, &config.throttle);

        Ok(Self {
            config: config.clone(),
            stores: db.stores(),
            links: Arc::new(LinkService::new(config.server.base_url.clone())),
            limiter,
            throttle,
        })
    }

    /// Fails unless attempt and request counters survive this process.
    /// Each CLI invocation is a fresh process, so local counters would
    /// start from zero on every password guess.
    pub fn require_shared_counters(&self) -> Result<(), AppError> {
        if self.config.has_shared_counters() {
            return Ok(());
        }
        Err(AppError::configuration(format!(
            "Share access needs limiter.backend = \"cache\" with cache.provider = \"redis\" \
             (found limiter.backend = \"{}\", cache.provider = \"{}\")",
            self.config.limiter.backend, self.config.cache.provider
        )))
    }

    pub fn codec(&self) -> EnvelopeCodec {
        EnvelopeCodec::from_config(&self.config.crypto)
    }

    pub fn access_service(&self) -> AccessService {
        AccessService::new(
            self.stores.shares.clone(),
            self.stores.files.clone(),
            self.stores.access_logs.clone(),
            self.limiter.clone(),
            self.throttle.clone(),
            self.codec(),
        )
    }

    pub fn share_service(&self, keys: Arc<dyn FileKeySource>) -> ShareService {
        ShareService::new(
            self.stores.shares.clone(),
            Arc::new(CatalogOwnershipChecker::new(self.stores.files.clone())),
            keys,
            self.links.clone(),
            SharePasswordPolicy::new(&self.config.share),
            self.codec(),
            self.config.share.max_token_attempts,
        )
    }
}

/// Hidden prompt for a share password.
pub fn prompt_password(prompt: &str, confirm: bool) -> Result<String, AppError> {
    let input = Password::new().with_prompt(prompt);
    let input = if confirm {
        input.with_confirmation("Repeat password", "Passwords do not match")
    } else {
        input
    };
    input
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Hidden prompt for a hex-encoded FileKey.
pub fn prompt_file_key() -> Result<FileKey, AppError> {
    let hex = zeroize::Zeroizing::new(
        Password::new()
            .with_prompt("File key (hex)")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    );
    Ok(FileKey::from_hex(&hex)?)
}
