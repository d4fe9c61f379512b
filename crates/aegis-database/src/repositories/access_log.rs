//! Share access-log repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aegis_core::error::{AppError, ErrorKind};
use aegis_core::result::AppResult;
use aegis_core::types::ShareId;
use aegis_entity::access::{AccessStats, NewAccessLog, ShareAccessLog};

use crate::store::AccessLogStore;

/// PostgreSQL access-log store.
#[derive(Debug, Clone)]
pub struct AccessLogRepository {
    pool: PgPool,
}

impl AccessLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessLogStore for AccessLogRepository {
    async fn append(&self, entry: NewAccessLog) -> AppResult<ShareAccessLog> {
        sqlx::query_as::<_, ShareAccessLog>(
            "INSERT INTO share_access_logs \
             (id, share_id, ip_address, user_agent, requester, success, failure_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(entry.share_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.requester)
        .bind(entry.success)
        .bind(&entry.failure_reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write access log", e))
    }

    async fn stats(
        &self,
        share_id: ShareId,
        recent_since: DateTime<Utc>,
    ) -> AppResult<AccessStats> {
        let (total, successful, failed, recent, unique_ips): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE success), \
                        COUNT(*) FILTER (WHERE NOT success), \
                        COUNT(*) FILTER (WHERE attempted_at >= $2), \
                        COUNT(DISTINCT ip_address) \
                 FROM share_access_logs WHERE share_id = $1",
            )
            .bind(share_id)
            .bind(recent_since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to compute access stats", e)
            })?;

        Ok(AccessStats {
            total_attempts: total,
            successful_attempts: successful,
            failed_attempts: failed,
            recent_attempts: recent,
            unique_ips,
        })
    }

    async fn recent(&self, share_id: ShareId, limit: i64) -> AppResult<Vec<ShareAccessLog>> {
        sqlx::query_as::<_, ShareAccessLog>(
            "SELECT * FROM share_access_logs WHERE share_id = $1 \
             ORDER BY attempted_at DESC LIMIT $2",
        )
        .bind(share_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list access logs", e))
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM share_access_logs WHERE attempted_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge access logs", e)
            })?;
        Ok(result.rows_affected())
    }
}
