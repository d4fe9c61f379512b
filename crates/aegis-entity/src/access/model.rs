//! Share access-log entities and client-detail sanitizing.

use std::net::IpAddr;

use aegis_core::types::ShareId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Longest user agent kept in the log.
pub const MAX_USER_AGENT_LEN: usize = 500;

/// One recorded access attempt against a share.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareAccessLog {
    pub id: Uuid,
    pub share_id: ShareId,
    pub ip_address: String,
    pub user_agent: String,
    pub requester: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// Data for appending a log entry.
#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub share_id: ShareId,
    pub ip_address: String,
    pub user_agent: String,
    pub requester: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
}

impl NewAccessLog {
    pub fn into_log(self, now: DateTime<Utc>) -> ShareAccessLog {
        ShareAccessLog {
            id: Uuid::new_v4(),
            share_id: self.share_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            requester: self.requester,
            success: self.success,
            failure_reason: self.failure_reason,
            attempted_at: now,
        }
    }
}

/// Client details of an access request, as received.
#[derive(Debug, Clone, Default)]
pub struct AccessAttempt {
    pub ip_address: String,
    pub user_agent: String,
}

impl AccessAttempt {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
        }
    }

    /// The IP address as a canonical string, `unknown` when absent and
    /// `invalid` when unparseable.
    pub fn sanitized_ip(&self) -> String {
        let raw = self.ip_address.trim();
        if raw.is_empty() {
            return "unknown".to_string();
        }
        raw.parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| "invalid".to_string())
    }

    /// The user agent with control characters removed, capped in length.
    pub fn sanitized_user_agent(&self) -> String {
        let cleaned: String = self
            .user_agent
            .chars()
            .filter(|c| !c.is_control())
            .take(MAX_USER_AGENT_LEN)
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            "unknown".to_string()
        } else {
            cleaned.to_string()
        }
    }
}

/// Aggregate access statistics for one share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessStats {
    pub total_attempts: i64,
    pub successful_attempts: i64,
    pub failed_attempts: i64,
    /// Attempts in the last 24 hours.
    pub recent_attempts: i64,
    pub unique_ips: i64,
}
