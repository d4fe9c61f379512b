//! Request context carrying the acting user and client details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aegis_core::types::UserId;
use aegis_entity::access::AccessAttempt;

/// Context for the current authenticated request.
///
/// Passed into owner-side service methods so that every operation knows
/// *who* is acting and from *where*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The username, used for allow-list checks when the user is a recipient.
    pub username: String,
    /// IP address of the request origin.
    pub ip_address: String,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        ip_address: impl Into<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            ip_address: ip_address.into(),
            user_agent,
            request_time: Utc::now(),
        }
    }

    /// Client details for the access audit trail.
    pub fn access_attempt(&self) -> AccessAttempt {
        AccessAttempt::new(
            self.ip_address.clone(),
            self.user_agent.clone().unwrap_or_default(),
        )
    }
}
