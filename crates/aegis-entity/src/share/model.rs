//! Share record entity model.

use aegis_core::types::{FileId, ShareId, UserId};
use aegis_crypto::WrappedKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metadata::ShareExpiryInfo;

/// `max_downloads` value meaning "no download limit".
pub const UNLIMITED_DOWNLOADS: i32 = -1;

/// Lifecycle state of a share, derived from its fields at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    /// Accepting access attempts.
    Active,
    /// Past its expiry time.
    Expired,
    /// Download quota used up.
    Exhausted,
    /// Revoked by the owner. Terminal.
    Revoked,
}

impl std::fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

/// One shareable link for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    /// Unique share identifier.
    pub id: ShareId,
    /// The shared file.
    pub file_id: FileId,
    /// Owner of the shared file.
    pub owner_id: UserId,
    /// Public 64-character hex token.
    pub token: String,
    /// FileKey wrapped under the share password.
    #[serde(skip_serializing)]
    pub wrapped_key: WrappedKey,
    /// Maximum downloads, or [`UNLIMITED_DOWNLOADS`].
    pub max_downloads: i32,
    /// Successful downloads so far.
    pub download_count: i32,
    /// When the share expires (`None` = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Usernames permitted to access. `None` means public.
    pub allowed_usernames: Option<Vec<String>>,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
    /// When the share was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the owner revoked the share.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ShareRecord {
    /// Whether the share has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_downloads == UNLIMITED_DOWNLOADS
    }

    pub fn is_download_limit_reached(&self) -> bool {
        !self.is_unlimited() && self.download_count >= self.max_downloads
    }

    /// Downloads left, or `-1` when unlimited.
    pub fn remaining_downloads(&self) -> i32 {
        if self.is_unlimited() {
            UNLIMITED_DOWNLOADS
        } else {
            (self.max_downloads - self.download_count).max(0)
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Whether access is restricted to named users. An empty list is public.
    pub fn is_restricted(&self) -> bool {
        self.allowed_usernames
            .as_ref()
            .is_some_and(|names| !names.is_empty())
    }

    /// Whether `identity` may attempt access. Anonymous callers pass only
    /// unrestricted shares.
    pub fn permits(&self, identity: Option<&str>) -> bool {
        match &self.allowed_usernames {
            Some(names) if !names.is_empty() => identity
                .is_some_and(|identity| names.iter().any(|name| name == identity.trim())),
            _ => true,
        }
    }

    /// Expiry view for display.
    pub fn expiry_info(&self, now: DateTime<Utc>) -> ShareExpiryInfo {
        match self.expires_at {
            None => ShareExpiryInfo::never(),
            Some(expires_at) => {
                let expired = self.is_expired_at(now);
                ShareExpiryInfo {
                    expires: true,
                    expired,
                    expires_at: Some(expires_at),
                    seconds_until_expiry: (!expired)
                        .then(|| (expires_at - now).num_seconds()),
                }
            }
        }
    }

    /// Current lifecycle state. Revocation wins over expiry, expiry over quota.
    pub fn status(&self, now: DateTime<Utc>) -> ShareStatus {
        if self.is_revoked() {
            ShareStatus::Revoked
        } else if self.is_expired_at(now) {
            ShareStatus::Expired
        } else if self.is_download_limit_reached() {
            ShareStatus::Exhausted
        } else {
            ShareStatus::Active
        }
    }

    /// First characters of the token, safe for logs.
    pub fn token_prefix(&self) -> &str {
        self.token.get(..8).unwrap_or(&self.token)
    }
}

/// Data required to persist a new share.
#[derive(Debug, Clone)]
pub struct NewShare {
    pub file_id: FileId,
    pub owner_id: UserId,
    pub token: String,
    pub wrapped_key: WrappedKey,
    pub max_downloads: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub allowed_usernames: Option<Vec<String>>,
}

impl NewShare {
    /// Materialize the record a store would persist, with `download_count = 0`.
    pub fn into_record(self, id: ShareId, now: DateTime<Utc>) -> ShareRecord {
        ShareRecord {
            id,
            file_id: self.file_id,
            owner_id: self.owner_id,
            token: self.token,
            wrapped_key: self.wrapped_key,
            max_downloads: self.max_downloads,
            download_count: 0,
            expires_at: self.expires_at,
            allowed_usernames: self.allowed_usernames,
            created_at: now,
            updated_at: now,
            revoked_at: None,
        }
    }
}
