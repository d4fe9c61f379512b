//! Owner-side share management: create, update, revoke, list.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use zeroize::Zeroizing;

use aegis_auth::ownership::OwnershipChecker;
use aegis_auth::password::SharePasswordPolicy;
use aegis_core::error::{AppError, ErrorKind};
use aegis_core::types::{FileId, ShareId};
use aegis_crypto::{EnvelopeCodec, FileKey, WrappedKey};
use aegis_database::store::ShareStore;
use aegis_entity::share::{NewShare, ShareFilter, SharePatch, ShareRecord, UNLIMITED_DOWNLOADS};

use super::keys::FileKeySource;
use super::link::LinkService;
use crate::context::RequestContext;

/// Request to create a new share.
#[derive(Clone)]
pub struct CreateShareRequest {
    pub file_id: FileId,
    pub password: String,
    /// `-1` for unlimited, otherwise at least 1.
    pub max_downloads: i32,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` and an empty list both mean public. A list holding only
    /// blank names is rejected.
    pub allowed_usernames: Option<Vec<String>>,
}

impl std::fmt::Debug for CreateShareRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateShareRequest")
            .field("file_id", &self.file_id)
            .field("password", &"[REDACTED]")
            .field("max_downloads", &self.max_downloads)
            .field("expires_at", &self.expires_at)
            .field("allowed_usernames", &self.allowed_usernames)
            .finish()
    }
}

/// Request to update an existing share. Absent fields are left unchanged.
#[derive(Clone, Default)]
pub struct UpdateShareRequest {
    /// `Some(None)` removes the expiry.
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub max_downloads: Option<i32>,
    /// A new password re-wraps the same FileKey with a fresh salt and IV.
    pub password: Option<String>,
    /// `Some(vec![])` removes the restriction. A list holding only blank
    /// names is rejected.
    pub allowed_usernames: Option<Vec<String>>,
}

impl std::fmt::Debug for UpdateShareRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateShareRequest")
            .field("expires_at", &self.expires_at)
            .field("max_downloads", &self.max_downloads)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_usernames", &self.allowed_usernames)
            .finish()
    }
}

/// Manages share creation, update, revocation, and listing.
#[derive(Debug, Clone)]
pub struct ShareService {
    shares: Arc<dyn ShareStore>,
    ownership: Arc<dyn OwnershipChecker>,
    keys: Arc<dyn FileKeySource>,
    links: Arc<LinkService>,
    policy: SharePasswordPolicy,
    codec: EnvelopeCodec,
    max_token_attempts: u32,
}

impl ShareService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shares: Arc<dyn ShareStore>,
        ownership: Arc<dyn OwnershipChecker>,
        keys: Arc<dyn FileKeySource>,
        links: Arc<LinkService>,
        policy: SharePasswordPolicy,
        codec: EnvelopeCodec,
        max_token_attempts: u32,
    ) -> Self {
        Self {
            shares,
            ownership,
            keys,
            links,
            policy,
            codec,
            max_token_attempts: max_token_attempts.max(1),
        }
    }

    /// Creates a share for a file the caller owns.
    pub async fn create_share(
        &self,
        ctx: &RequestContext,
        req: CreateShareRequest,
    ) -> Result<ShareRecord, AppError> {
        let password = Zeroizing::new(req.password);
        self.policy.validate(&password)?;
        validate_max_downloads(req.max_downloads)?;
        validate_expiry(req.expires_at, ctx.request_time)?;
        let allowed_usernames = req
            .allowed_usernames
            .map(normalize_usernames)
            .transpose()?
            .filter(|names| !names.is_empty());

        let file = self
            .ownership
            .require_ownership(ctx.user_id, req.file_id)
            .await?;
        let file_key = self.keys.file_key(ctx.user_id, &file).await?;
        let wrapped_key = self.wrap(file_key, password).await?;

        let mut attempt = 1;
        let record = loop {
            let share = NewShare {
                file_id: file.id,
                owner_id: ctx.user_id,
                token: self.links.generate_secure_token()?,
                wrapped_key: wrapped_key.clone(),
                max_downloads: req.max_downloads,
                expires_at: req.expires_at,
                allowed_usernames: allowed_usernames.clone(),
            };
            match self.shares.create(share).await {
                Ok(record) => break record,
                Err(e) if e.is(ErrorKind::Conflict) && attempt < self.max_token_attempts => {
                    debug!(attempt, "Share token collision, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            user_id = %ctx.user_id,
            share_id = %record.id,
            file_id = %record.file_id,
            token = %record.token_prefix(),
            max_downloads = record.max_downloads,
            restricted = record.is_restricted(),
            "Share created"
        );
        Ok(record)
    }

    /// Gets one of the caller's shares.
    pub async fn get_share(
        &self,
        ctx: &RequestContext,
        share_id: ShareId,
    ) -> Result<ShareRecord, AppError> {
        self.shares
            .find_by_id(ctx.user_id, share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))
    }

    /// Lists the caller's shares, newest first.
    pub async fn list_shares(
        &self,
        ctx: &RequestContext,
        filter: &ShareFilter,
    ) -> Result<Vec<ShareRecord>, AppError> {
        self.shares.find_by_owner(ctx.user_id, filter).await
    }

    /// Updates a share. Only the owner of the underlying file may do so.
    pub async fn update_share(
        &self,
        ctx: &RequestContext,
        share_id: ShareId,
        req: UpdateShareRequest,
    ) -> Result<ShareRecord, AppError> {
        let current = self.owned_share(ctx, share_id).await?;
        if current.is_revoked() {
            return Err(AppError::validation("A revoked share cannot be updated"));
        }

        let mut patch = SharePatch {
            expires_at: req.expires_at,
            max_downloads: req.max_downloads,
            wrapped_key: None,
            allowed_usernames: req
                .allowed_usernames
                .map(normalize_usernames)
                .transpose()?,
        };

        if let Some(max_downloads) = patch.max_downloads {
            validate_max_downloads(max_downloads)?;
        }
        if let Some(expires_at) = patch.expires_at {
            validate_expiry(expires_at, ctx.request_time)?;
        }
        if patch.violates_quota(&current) {
            return Err(AppError::validation(
                "max_downloads cannot be lower than the current download count",
            ));
        }

        if let Some(password) = req.password.map(Zeroizing::new) {
            self.policy.validate(&password)?;
            let file = self
                .ownership
                .require_ownership(ctx.user_id, current.file_id)
                .await?;
            let file_key = self.keys.file_key(ctx.user_id, &file).await?;
            patch.wrapped_key = Some(self.wrap(file_key, password).await?);
        }

        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self.shares.update(share_id, &patch).await?;
        info!(
            user_id = %ctx.user_id,
            share_id = %share_id,
            rekeyed = patch.wrapped_key.is_some(),
            "Share updated"
        );
        Ok(updated)
    }

    /// Revokes a share. Returns `false` if it was already revoked.
    pub async fn revoke_share(
        &self,
        ctx: &RequestContext,
        share_id: ShareId,
    ) -> Result<bool, AppError> {
        self.owned_share(ctx, share_id).await?;
        let revoked = self.shares.revoke(share_id).await?;
        if revoked {
            info!(user_id = %ctx.user_id, share_id = %share_id, "Share revoked");
        }
        Ok(revoked)
    }

    /// Loads a share scoped to the caller and re-checks ownership of its file.
    async fn owned_share(
        &self,
        ctx: &RequestContext,
        share_id: ShareId,
    ) -> Result<ShareRecord, AppError> {
        let share = self.get_share(ctx, share_id).await?;
        self.ownership
            .require_ownership(ctx.user_id, share.file_id)
            .await?;
        Ok(share)
    }

    async fn wrap(
        &self,
        file_key: FileKey,
        password: Zeroizing<String>,
    ) -> Result<WrappedKey, AppError> {
        let codec = self.codec;
        tokio::task::spawn_blocking(move || codec.wrap_key(&file_key, &password))
            .await
            .map_err(|e| AppError::internal(format!("Key wrap task failed: {e}")))?
            .map_err(AppError::from)
    }
}

fn validate_max_downloads(max_downloads: i32) -> Result<(), AppError> {
    if max_downloads == UNLIMITED_DOWNLOADS || max_downloads >= 1 {
        Ok(())
    } else {
        Err(AppError::validation(
            "max_downloads must be -1 (unlimited) or at least 1",
        ))
    }
}

fn validate_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), AppError> {
    match expires_at {
        Some(at) if at <= now => Err(AppError::validation("Expiry must be in the future")),
        _ => Ok(()),
    }
}

/// Trim names, drop blanks and duplicates, keep first-seen order.
///
/// An empty input stays empty. A non-empty input with no usable name is
/// a validation error, never an empty (public) list.
fn normalize_usernames(names: Vec<String>) -> Result<Vec<String>, AppError> {
    let supplied = names.len();
    let mut out: Vec<String> = Vec::with_capacity(supplied);
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    if supplied > 0 && out.is_empty() {
        return Err(AppError::validation(
            "allowed_usernames must contain at least one non-blank username",
        ));
    }
    Ok(out)
}
