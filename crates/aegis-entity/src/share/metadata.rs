//! Non-secret share views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{ShareRecord, ShareStatus};
use crate::file::FileDescriptor;

/// Expiry details of a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareExpiryInfo {
    /// Whether the share has an expiry at all.
    pub expires: bool,
    /// Whether the expiry has passed.
    pub expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole seconds left, present only while not expired.
    pub seconds_until_expiry: Option<i64>,
}

impl ShareExpiryInfo {
    pub fn never() -> Self {
        Self {
            expires: false,
            expired: false,
            expires_at: None,
            seconds_until_expiry: None,
        }
    }
}

/// What a recipient sees before entering a password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicShareMetadata {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub max_downloads: i32,
    pub download_count: i32,
    /// `-1` when unlimited.
    pub remaining_downloads: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Whether access is limited to named users. The names are not exposed.
    pub restricted: bool,
    pub status: ShareStatus,
}

impl PublicShareMetadata {
    pub fn new(record: &ShareRecord, file: &FileDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            filename: file.filename.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes,
            max_downloads: record.max_downloads,
            download_count: record.download_count,
            remaining_downloads: record.remaining_downloads(),
            expires_at: record.expires_at,
            created_at: record.created_at,
            restricted: record.is_restricted(),
            status: record.status(now),
        }
    }
}
