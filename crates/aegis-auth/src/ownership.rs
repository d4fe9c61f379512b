//! File ownership checks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use aegis_core::error::AppError;
use aegis_core::types::{FileId, UserId};
use aegis_database::store::FileCatalog;
use aegis_entity::file::FileDescriptor;

/// Answers "may this actor manage shares of this file?".
#[async_trait]
pub trait OwnershipChecker: Send + Sync + std::fmt::Debug {
    /// Returns the file when `actor_id` owns it.
    ///
    /// Fails with `NotFound` for unknown files and `Authorization` for files
    /// owned by someone else.
    async fn require_ownership(
        &self,
        actor_id: UserId,
        file_id: FileId,
    ) -> Result<FileDescriptor, AppError>;
}

/// Ownership taken from the file catalog's `owner_id`.
#[derive(Debug, Clone)]
pub struct CatalogOwnershipChecker {
    catalog: Arc<dyn FileCatalog>,
}

impl CatalogOwnershipChecker {
    pub fn new(catalog: Arc<dyn FileCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl OwnershipChecker for CatalogOwnershipChecker {
    async fn require_ownership(
        &self,
        actor_id: UserId,
        file_id: FileId,
    ) -> Result<FileDescriptor, AppError> {
        let file = self
            .catalog
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        if file.owner_id != actor_id {
            warn!(actor_id = %actor_id, file_id = %file_id, "Ownership check denied");
            return Err(AppError::authorization(
                "You do not have permission to share this file",
            ));
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::ErrorKind;
    use aegis_database::memory::MemoryFileCatalog;
    use chrono::Utc;

    async fn setup() -> (CatalogOwnershipChecker, FileDescriptor) {
        let catalog = MemoryFileCatalog::new();
        let file = catalog
            .register(FileDescriptor {
                id: FileId::new(),
                owner_id: UserId::new(),
                filename: "report.pdf".into(),
                mime_type: "application/pdf".into(),
                size_bytes: 1024,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        (CatalogOwnershipChecker::new(Arc::new(catalog)), file)
    }

    #[tokio::test]
    async fn test_owner_passes() {
        let (checker, file) = setup().await;
        let found = checker.require_ownership(file.owner_id, file.id).await.unwrap();
        assert_eq!(found.id, file.id);
    }

    #[tokio::test]
    async fn test_other_user_denied() {
        let (checker, file) = setup().await;
        let err = checker
            .require_ownership(UserId::new(), file.id)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Authorization));
    }

    #[tokio::test]
    async fn test_unknown_file() {
        let (checker, file) = setup().await;
        let err = checker
            .require_ownership(file.owner_id, FileId::new())
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }
}
