//! File catalog repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use aegis_core::error::{AppError, ErrorKind};
use aegis_core::result::AppResult;
use aegis_core::types::{FileId, UserId};
use aegis_entity::file::FileDescriptor;

use crate::store::FileCatalog;

/// PostgreSQL file catalog.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileCatalog for FileRepository {
    async fn register(&self, file: FileDescriptor) -> AppResult<FileDescriptor> {
        sqlx::query_as::<_, FileDescriptor>(
            "INSERT INTO files (id, owner_id, filename, mime_type, size_bytes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, owner_id, filename, mime_type, size_bytes, created_at",
        )
        .bind(file.id)
        .bind(file.owner_id)
        .bind(&file.filename)
        .bind(&file.mime_type)
        .bind(file.size_bytes)
        .bind(file.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to register file", e))
    }

    async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileDescriptor>> {
        sqlx::query_as::<_, FileDescriptor>(
            "SELECT id, owner_id, filename, mime_type, size_bytes, created_at \
             FROM files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn list_by_owner(&self, owner_id: UserId) -> AppResult<Vec<FileDescriptor>> {
        sqlx::query_as::<_, FileDescriptor>(
            "SELECT id, owner_id, filename, mime_type, size_bytes, created_at \
             FROM files WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }
}
