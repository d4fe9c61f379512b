//! Tri-state share updates.

use aegis_crypto::WrappedKey;
use chrono::{DateTime, Utc};

use super::model::{ShareRecord, UNLIMITED_DOWNLOADS};

/// Fields to change on an existing share.
///
/// `None` leaves a field untouched. For `expires_at`, `Some(None)` clears
/// the expiry. For `allowed_usernames`, `Some(vec![])` removes the
/// restriction and is stored as "public".
#[derive(Debug, Clone, Default)]
pub struct SharePatch {
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub max_downloads: Option<i32>,
    pub wrapped_key: Option<WrappedKey>,
    pub allowed_usernames: Option<Vec<String>>,
}

impl SharePatch {
    pub fn is_empty(&self) -> bool {
        self.expires_at.is_none()
            && self.max_downloads.is_none()
            && self.wrapped_key.is_none()
            && self.allowed_usernames.is_none()
    }

    /// The stored form of the allow-list change: an empty list becomes `None`.
    pub fn stored_allowed_usernames(&self) -> Option<Option<Vec<String>>> {
        self.allowed_usernames
            .as_ref()
            .map(|names| (!names.is_empty()).then(|| names.clone()))
    }

    /// Apply the patch to an in-memory record.
    pub fn apply_to(&self, record: &mut ShareRecord, now: DateTime<Utc>) {
        if let Some(expires_at) = self.expires_at {
            record.expires_at = expires_at;
        }
        if let Some(max_downloads) = self.max_downloads {
            record.max_downloads = max_downloads;
        }
        if let Some(wrapped_key) = &self.wrapped_key {
            record.wrapped_key = wrapped_key.clone();
        }
        if let Some(allowed) = self.stored_allowed_usernames() {
            record.allowed_usernames = allowed;
        }
        record.updated_at = now;
    }

    /// Whether applying the patch would put `record` over its quota.
    pub fn violates_quota(&self, record: &ShareRecord) -> bool {
        self.max_downloads
            .is_some_and(|max| max != UNLIMITED_DOWNLOADS && max < record.download_count)
    }
}
