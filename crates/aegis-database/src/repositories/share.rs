//! Share repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use aegis_core::error::{AppError, ErrorKind};
use aegis_core::result::AppResult;
use aegis_core::types::{FileId, ShareId, UserId};
use aegis_crypto::WrappedKey;
use aegis_entity::share::{NewShare, SharePatch, ShareFilter, ShareRecord};

use crate::store::ShareStore;

const SHARE_COLUMNS: &str = "id, file_id, owner_id, token, key_salt, key_iv, key_ciphertext, \
     max_downloads, download_count, expires_at, allowed_usernames, created_at, updated_at, revoked_at";

const NOT_EXPIRED: &str = "(expires_at IS NULL OR expires_at > NOW())";
const UNDER_LIMIT: &str = "(max_downloads = -1 OR download_count < max_downloads)";

/// Row shape of the `shares` table.
#[derive(Debug, FromRow)]
struct ShareRow {
    id: ShareId,
    file_id: FileId,
    owner_id: UserId,
    token: String,
    key_salt: Vec<u8>,
    key_iv: Vec<u8>,
    key_ciphertext: Vec<u8>,
    max_downloads: i32,
    download_count: i32,
    expires_at: Option<DateTime<Utc>>,
    allowed_usernames: Option<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<ShareRow> for ShareRecord {
    fn from(row: ShareRow) -> Self {
        Self {
            id: row.id,
            file_id: row.file_id,
            owner_id: row.owner_id,
            token: row.token,
            wrapped_key: WrappedKey {
                salt: row.key_salt,
                iv: row.key_iv,
                ciphertext: row.key_ciphertext,
            },
            max_downloads: row.max_downloads,
            download_count: row.download_count,
            expires_at: row.expires_at,
            allowed_usernames: row.allowed_usernames,
            created_at: row.created_at,
            updated_at: row.updated_at,
            revoked_at: row.revoked_at,
        }
    }
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

/// Push the WHERE fragment for `filter`, mirroring `ShareRecord::status`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ShareFilter) {
    match filter {
        ShareFilter::All => {}
        ShareFilter::Active => {
            qb.push(format!(
                " AND revoked_at IS NULL AND {NOT_EXPIRED} AND {UNDER_LIMIT}"
            ));
        }
        ShareFilter::Expired => {
            qb.push(" AND revoked_at IS NULL AND expires_at IS NOT NULL AND expires_at <= NOW()");
        }
        ShareFilter::Exhausted => {
            qb.push(format!(
                " AND revoked_at IS NULL AND {NOT_EXPIRED} AND NOT {UNDER_LIMIT}"
            ));
        }
        ShareFilter::Revoked => {
            qb.push(" AND revoked_at IS NOT NULL");
        }
        ShareFilter::ForFile(file_id) => {
            qb.push(" AND file_id = ").push_bind(*file_id);
        }
    }
}

/// PostgreSQL share store.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareStore for ShareRepository {
    async fn create(&self, share: NewShare) -> AppResult<ShareRecord> {
        let sql = format!(
            "INSERT INTO shares (id, file_id, owner_id, token, key_salt, key_iv, key_ciphertext, \
             max_downloads, download_count, expires_at, allowed_usernames) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10) RETURNING {SHARE_COLUMNS}"
        );
        sqlx::query_as::<_, ShareRow>(&sql)
            .bind(ShareId::new())
            .bind(share.file_id)
            .bind(share.owner_id)
            .bind(&share.token)
            .bind(&share.wrapped_key.salt)
            .bind(&share.wrapped_key.iv)
            .bind(&share.wrapped_key.ciphertext)
            .bind(share.max_downloads)
            .bind(share.expires_at)
            .bind(&share.allowed_usernames)
            .fetch_one(&self.pool)
            .await
            .map(ShareRecord::from)
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                    AppError::with_source(ErrorKind::Conflict, "Share token already exists", e)
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to create share", e)
                }
            })
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareRecord>> {
        let sql =
            format!("SELECT {SHARE_COLUMNS} FROM shares WHERE token = $1 AND revoked_at IS NULL");
        sqlx::query_as::<_, ShareRow>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(ShareRecord::from))
            .map_err(db_err("Failed to find share by token"))
    }

    async fn find_by_id(&self, owner_id: UserId, id: ShareId) -> AppResult<Option<ShareRecord>> {
        let sql = format!("SELECT {SHARE_COLUMNS} FROM shares WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, ShareRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(ShareRecord::from))
            .map_err(db_err("Failed to find share"))
    }

    async fn find_by_owner(
        &self,
        owner_id: UserId,
        filter: &ShareFilter,
    ) -> AppResult<Vec<ShareRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE owner_id = "
        ));
        qb.push_bind(owner_id);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");

        let rows = qb
            .build_query_as::<ShareRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list shares"))?;
        Ok(rows.into_iter().map(ShareRecord::from).collect())
    }

    async fn atomic_increment_if_under_limit(&self, token: &str) -> AppResult<Option<i32>> {
        let sql = format!(
            "UPDATE shares SET download_count = download_count + 1, updated_at = NOW() \
             WHERE token = $1 AND revoked_at IS NULL AND {UNDER_LIMIT} AND {NOT_EXPIRED} \
             RETURNING download_count"
        );
        let count: Option<i32> = sqlx::query_scalar(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to consume share download"))?;

        debug!(consumed = count.is_some(), "Conditional download increment");
        Ok(count)
    }

    async fn update(&self, id: ShareId, patch: &SharePatch) -> AppResult<ShareRecord> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE shares SET updated_at = NOW()");
        if let Some(expires_at) = patch.expires_at {
            qb.push(", expires_at = ").push_bind(expires_at);
        }
        if let Some(max_downloads) = patch.max_downloads {
            qb.push(", max_downloads = ").push_bind(max_downloads);
        }
        if let Some(wrapped) = &patch.wrapped_key {
            qb.push(", key_salt = ").push_bind(wrapped.salt.clone());
            qb.push(", key_iv = ").push_bind(wrapped.iv.clone());
            qb.push(", key_ciphertext = ")
                .push_bind(wrapped.ciphertext.clone());
        }
        if let Some(allowed) = patch.stored_allowed_usernames() {
            qb.push(", allowed_usernames = ").push_bind(allowed);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(format!(" RETURNING {SHARE_COLUMNS}"));

        qb.build_query_as::<ShareRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_check_violation()) {
                    AppError::with_source(
                        ErrorKind::Validation,
                        "max_downloads cannot be lower than the current download count",
                        e,
                    )
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to update share", e)
                }
            })?
            .map(ShareRecord::from)
            .ok_or_else(|| AppError::not_found("Share not found"))
    }

    async fn revoke(&self, id: ShareId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE shares SET revoked_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to revoke share"))?;
        Ok(result.rows_affected() > 0)
    }
}
