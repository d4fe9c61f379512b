//! Store interfaces used by the share services.
//!
//! Implementations must honour the atomicity contracts documented on each
//! method; the services rely on them instead of locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use aegis_core::result::AppResult;
use aegis_core::types::{FileId, ShareId, UserId};
use aegis_entity::access::{AccessStats, NewAccessLog, ShareAccessLog};
use aegis_entity::file::FileDescriptor;
use aegis_entity::share::{NewShare, SharePatch, ShareFilter, ShareRecord};

/// Persistence for share records.
#[async_trait]
pub trait ShareStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new share with `download_count = 0`.
    ///
    /// Fails with `Conflict` when the token is already taken.
    async fn create(&self, share: NewShare) -> AppResult<ShareRecord>;

    /// Find a non-revoked share by its public token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareRecord>>;

    /// Find a share by id, scoped to its owner.
    async fn find_by_id(&self, owner_id: UserId, id: ShareId) -> AppResult<Option<ShareRecord>>;

    /// All of an owner's shares passing `filter`, newest first.
    async fn find_by_owner(
        &self,
        owner_id: UserId,
        filter: &ShareFilter,
    ) -> AppResult<Vec<ShareRecord>>;

    /// Consume one download in a single atomic step.
    ///
    /// Increments `download_count` only if the share is not revoked, not
    /// expired, and under its limit. Returns the new count, or `None` when
    /// nothing was consumed.
    async fn atomic_increment_if_under_limit(&self, token: &str) -> AppResult<Option<i32>>;

    /// Apply a tri-state patch. Fails with `NotFound` for unknown ids.
    async fn update(&self, id: ShareId, patch: &SharePatch) -> AppResult<ShareRecord>;

    /// Mark a share revoked. Returns `false` if it was already revoked or
    /// does not exist.
    async fn revoke(&self, id: ShareId) -> AppResult<bool>;
}

/// Lookup of file descriptors for ownership checks and share metadata.
#[async_trait]
pub trait FileCatalog: Send + Sync + std::fmt::Debug + 'static {
    async fn register(&self, file: FileDescriptor) -> AppResult<FileDescriptor>;

    async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileDescriptor>>;

    async fn list_by_owner(&self, owner_id: UserId) -> AppResult<Vec<FileDescriptor>>;
}

/// Append-only audit trail of share access attempts.
#[async_trait]
pub trait AccessLogStore: Send + Sync + std::fmt::Debug + 'static {
    async fn append(&self, entry: NewAccessLog) -> AppResult<ShareAccessLog>;

    /// Aggregate counts for one share. `recent_since` bounds `recent_attempts`.
    async fn stats(&self, share_id: ShareId, recent_since: DateTime<Utc>)
    -> AppResult<AccessStats>;

    /// Most recent entries for one share.
    async fn recent(&self, share_id: ShareId, limit: i64) -> AppResult<Vec<ShareAccessLog>>;

    /// Delete entries older than `cutoff`. Returns how many were removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
