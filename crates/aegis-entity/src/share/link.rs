//! Share link value object.

use aegis_core::types::ShareId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated share link for external access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLink {
    /// The share ID.
    pub share_id: ShareId,
    /// The full URL for accessing the share.
    pub url: String,
    /// The share token.
    pub token: String,
    /// When the link expires (if set).
    pub expires_at: Option<DateTime<Utc>>,
    /// Maximum downloads, `-1` for unlimited.
    pub max_downloads: i32,
}
