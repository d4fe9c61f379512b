//! File descriptor entity.

use aegis_core::types::{FileId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog entry for a stored file. The content itself lives elsewhere and
/// is only ever ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileDescriptor {
    /// Unique file identifier.
    pub id: FileId,
    /// User who uploaded the file.
    pub owner_id: UserId,
    /// Display filename.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Plaintext size in bytes.
    pub size_bytes: i64,
    /// When the file was registered.
    pub created_at: DateTime<Utc>,
}
