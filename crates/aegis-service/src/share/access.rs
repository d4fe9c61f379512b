//! Recipient-side share access: token validation, password-gated unwrap,
//! and quota consumption.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use zeroize::Zeroizing;

use aegis_auth::limiter::AttemptLimiter;
use aegis_auth::throttle::RequestThrottle;
use aegis_core::error::AppError;
use aegis_core::types::{ShareId, UserId};
use aegis_crypto::{EnvelopeCodec, FileKey};
use aegis_database::store::{AccessLogStore, FileCatalog, ShareStore};
use aegis_entity::access::{AccessAttempt, AccessStats, NewAccessLog, ShareAccessLog};
use aegis_entity::share::{PublicShareMetadata, ShareRecord};

use super::link::is_well_formed_token;

/// Window for `AccessStats::recent_attempts`.
const RECENT_WINDOW_HOURS: i64 = 24;

/// Result of a successful share access. The key is handed to the caller
/// and must not be persisted.
#[derive(Debug)]
pub struct AccessGrant {
    pub share_id: ShareId,
    pub file_key: FileKey,
    /// Downloads consumed including this one.
    pub download_count: i32,
    /// Downloads left, `-1` for unlimited.
    pub remaining_downloads: i32,
}

/// Handles public share access.
#[derive(Debug, Clone)]
pub struct AccessService {
    shares: Arc<dyn ShareStore>,
    files: Arc<dyn FileCatalog>,
    access_logs: Arc<dyn AccessLogStore>,
    limiter: Arc<dyn AttemptLimiter>,
    throttle: RequestThrottle,
    codec: EnvelopeCodec,
}

impl AccessService {
    pub fn new(
        shares: Arc<dyn ShareStore>,
        files: Arc<dyn FileCatalog>,
        access_logs: Arc<dyn AccessLogStore>,
        limiter: Arc<dyn AttemptLimiter>,
        throttle: RequestThrottle,
        codec: EnvelopeCodec,
    ) -> Self {
        Self {
            shares,
            files,
            access_logs,
            limiter,
            throttle,
            codec,
        }
    }

    /// Cheap pre-check: token shape, existence, expiry, and quota.
    ///
    /// Checks run in that order and stop at the first failure. Malformed
    /// tokens never reach the store. Neither the password nor the
    /// allow-list is looked at here.
    pub async fn validate_share_token(&self, token: &str) -> Result<ShareRecord, AppError> {
        check_token_shape(token)?;

        let record = self
            .shares
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;

        if record.is_expired_at(Utc::now()) {
            return Err(AppError::expired("Share has expired"));
        }
        if record.is_download_limit_reached() {
            return Err(AppError::quota_exceeded("Download limit exceeded"));
        }
        Ok(record)
    }

    /// Non-secret details for rendering an access prompt. No password
    /// needed, but the request counts against the client's throttle.
    pub async fn get_share_metadata(
        &self,
        token: &str,
        attempt: &AccessAttempt,
    ) -> Result<PublicShareMetadata, AppError> {
        let record = self.admit(token, attempt).await?;
        let file = self
            .files
            .find_by_id(record.file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        Ok(PublicShareMetadata::new(&record, &file, Utc::now()))
    }

    /// Unwrap the share's FileKey with `password` and consume one download.
    ///
    /// Order after token validation: allow-list, attempt reservation,
    /// password, quota. A locked-out token fails before any key derivation.
    pub async fn access_shared_file(
        &self,
        token: &str,
        password: &str,
        requester: Option<&str>,
        attempt: &AccessAttempt,
    ) -> Result<AccessGrant, AppError> {
        let record = self.admit(token, attempt).await?;

        if !record.permits(requester) {
            warn!(
                token = %record.token_prefix(),
                requester = requester.unwrap_or("anonymous"),
                "Requester not on share allow-list"
            );
            self.audit(&record, requester, attempt, Some("not_allowed"))
                .await;
            return Err(AppError::authorization(
                "You are not allowed to access this share",
            ));
        }

        let permit = match self.limiter.try_acquire(token).await {
            Ok(permit) => permit,
            Err(e) => {
                self.audit(&record, requester, attempt, Some("rate_limited"))
                    .await;
                return Err(e);
            }
        };

        let file_key = match self.unwrap(&record, password).await? {
            Ok(key) => key,
            Err(e) => {
                let state = self.limiter.record_failure(permit).await?;
                warn!(token = %record.token_prefix(), ?state, "Invalid share password");
                self.audit(&record, requester, attempt, Some("invalid_password"))
                    .await;
                return Err(e);
            }
        };

        if let Err(e) = self.limiter.release(permit).await {
            warn!(token = %record.token_prefix(), error = %e, "Failed to reset attempt counter");
        }

        let Some(download_count) = self
            .shares
            .atomic_increment_if_under_limit(token)
            .await?
        else {
            self.audit(&record, requester, attempt, Some("quota_exceeded"))
                .await;
            return Err(AppError::quota_exceeded("Download limit exceeded"));
        };

        self.audit(&record, requester, attempt, None).await;

        let remaining_downloads = if record.is_unlimited() {
            -1
        } else {
            (record.max_downloads - download_count).max(0)
        };
        info!(
            token = %record.token_prefix(),
            share_id = %record.id,
            download_count,
            "Share accessed"
        );

        Ok(AccessGrant {
            share_id: record.id,
            file_key,
            download_count,
            remaining_downloads,
        })
    }

    /// Access statistics for one of `owner_id`'s shares.
    pub async fn access_stats(
        &self,
        owner_id: UserId,
        share_id: ShareId,
    ) -> Result<AccessStats, AppError> {
        self.require_owned(owner_id, share_id).await?;
        let since = Utc::now() - Duration::hours(RECENT_WINDOW_HOURS);
        self.access_logs.stats(share_id, since).await
    }

    /// Most recent access attempts for one of `owner_id`'s shares.
    pub async fn recent_access(
        &self,
        owner_id: UserId,
        share_id: ShareId,
        limit: i64,
    ) -> Result<Vec<ShareAccessLog>, AppError> {
        self.require_owned(owner_id, share_id).await?;
        self.access_logs.recent(share_id, limit.clamp(1, 1000)).await
    }

    /// Delete audit entries older than `cutoff`.
    pub async fn purge_access_logs(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let removed = self.access_logs.purge_older_than(cutoff).await?;
        info!(removed, cutoff = %cutoff, "Purged share access logs");
        Ok(removed)
    }

    /// Runs PBKDF2 and AES-GCM on the blocking pool. The outer error is a
    /// task failure, the inner one an authentication failure.
    async fn unwrap(
        &self,
        record: &ShareRecord,
        password: &str,
    ) -> Result<Result<FileKey, AppError>, AppError> {
        let codec = self.codec;
        let wrapped = record.wrapped_key.clone();
        let password = Zeroizing::new(password.to_string());

        tokio::task::spawn_blocking(move || {
            codec
                .unwrap_key(&wrapped, &password)
                .map_err(AppError::from)
        })
        .await
        .map_err(|e| AppError::internal(format!("Key unwrap task failed: {e}")))
    }

    /// Shape check, per-client throttle, then validation. Garbage tokens
    /// are rejected before they cost the client or the store anything.
    async fn admit(&self, token: &str, attempt: &AccessAttempt) -> Result<ShareRecord, AppError> {
        check_token_shape(token)?;
        self.throttle.check(&attempt.sanitized_ip(), token).await?;
        self.validate_share_token(token).await
    }

    async fn require_owned(&self, owner_id: UserId, share_id: ShareId) -> Result<(), AppError> {
        self.shares
            .find_by_id(owner_id, share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        Ok(())
    }

    /// Audit failures are logged and never fail the access.
    async fn audit(
        &self,
        record: &ShareRecord,
        requester: Option<&str>,
        attempt: &AccessAttempt,
        failure_reason: Option<&str>,
    ) {
        let entry = NewAccessLog {
            share_id: record.id,
            ip_address: attempt.sanitized_ip(),
            user_agent: attempt.sanitized_user_agent(),
            requester: requester.map(str::to_string),
            success: failure_reason.is_none(),
            failure_reason: failure_reason.map(str::to_string),
        };
        if let Err(e) = self.access_logs.append(entry).await {
            warn!(share_id = %record.id, error = %e, "Failed to record share access");
        }
    }
}

fn check_token_shape(token: &str) -> Result<(), AppError> {
    if token.is_empty() {
        return Err(AppError::validation("Share token cannot be empty"));
    }
    if !is_well_formed_token(token) {
        return Err(AppError::validation("Invalid share token format"));
    }
    Ok(())
}
