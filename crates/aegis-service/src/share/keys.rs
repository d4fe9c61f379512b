//! Where the owner's FileKey comes from when a share is created or re-keyed.

use async_trait::async_trait;

use aegis_core::error::AppError;
use aegis_core::types::{FileId, UserId};
use aegis_crypto::FileKey;
use aegis_entity::file::FileDescriptor;

/// Supplies the owner's FileKey for a file the owner has already been
/// verified to own. The key is used to produce a share wrap and dropped.
#[async_trait]
pub trait FileKeySource: Send + Sync + std::fmt::Debug {
    async fn file_key(&self, owner_id: UserId, file: &FileDescriptor) -> Result<FileKey, AppError>;
}

/// A FileKey handed over by the client for the duration of one request.
///
/// Optionally bound to one file, in which case any other file is refused.
#[derive(Debug, Clone)]
pub struct ProvidedFileKey {
    file_id: Option<FileId>,
    key: FileKey,
}

impl ProvidedFileKey {
    pub fn new(key: FileKey) -> Self {
        Self { file_id: None, key }
    }

    pub fn for_file(file_id: FileId, key: FileKey) -> Self {
        Self {
            file_id: Some(file_id),
            key,
        }
    }
}

#[async_trait]
impl FileKeySource for ProvidedFileKey {
    async fn file_key(&self, _owner_id: UserId, file: &FileDescriptor) -> Result<FileKey, AppError> {
        match self.file_id {
            Some(bound) if bound != file.id => Err(AppError::validation(
                "The supplied file key belongs to a different file",
            )),
            _ => Ok(self.key.clone()),
        }
    }
}
