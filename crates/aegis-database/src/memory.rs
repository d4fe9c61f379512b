//! In-process store implementations.
//!
//! Used by the integration tests and by single-node tooling. The share
//! store keeps records in a [`DashMap`]; the quota check-and-increment
//! happens while holding the record's shard write lock, which gives the
//! same all-or-nothing behaviour as the conditional `UPDATE` in
//! PostgreSQL.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use aegis_core::error::AppError;
use aegis_core::result::AppResult;
use aegis_core::types::{FileId, ShareId, UserId};
use aegis_entity::access::{AccessStats, NewAccessLog, ShareAccessLog};
use aegis_entity::file::FileDescriptor;
use aegis_entity::share::{NewShare, SharePatch, ShareFilter, ShareRecord};

use crate::store::{AccessLogStore, FileCatalog, ShareStore};

/// In-memory share store.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    records: Arc<DashMap<ShareId, ShareRecord>>,
    tokens: Arc<DashMap<String, ShareId>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, bypassing creation rules.
    pub fn insert_record(&self, record: ShareRecord) {
        self.tokens.insert(record.token.clone(), record.id);
        self.records.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn create(&self, share: NewShare) -> AppResult<ShareRecord> {
        match self.tokens.entry(share.token.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict("Share token already exists")),
            Entry::Vacant(slot) => {
                let id = ShareId::new();
                let record = share.into_record(id, Utc::now());
                self.records.insert(id, record.clone());
                slot.insert(id);
                Ok(record)
            }
        }
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareRecord>> {
        let Some(id) = self.tokens.get(token).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self
            .records
            .get(&id)
            .filter(|record| !record.is_revoked())
            .map(|record| record.clone()))
    }

    async fn find_by_id(&self, owner_id: UserId, id: ShareId) -> AppResult<Option<ShareRecord>> {
        Ok(self
            .records
            .get(&id)
            .filter(|record| record.owner_id == owner_id)
            .map(|record| record.clone()))
    }

    async fn find_by_owner(
        &self,
        owner_id: UserId,
        filter: &ShareFilter,
    ) -> AppResult<Vec<ShareRecord>> {
        let now = Utc::now();
        let mut shares: Vec<ShareRecord> = self
            .records
            .iter()
            .filter(|entry| entry.owner_id == owner_id && filter.matches(entry.value(), now))
            .map(|entry| entry.value().clone())
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    async fn atomic_increment_if_under_limit(&self, token: &str) -> AppResult<Option<i32>> {
        let Some(id) = self.tokens.get(token).map(|id| *id) else {
            return Ok(None);
        };
        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(None);
        };

        let now = Utc::now();
        if record.is_revoked() || record.is_expired_at(now) || record.is_download_limit_reached()
        {
            return Ok(None);
        }
        record.download_count += 1;
        record.updated_at = now;
        Ok(Some(record.download_count))
    }

    async fn update(&self, id: ShareId, patch: &SharePatch) -> AppResult<ShareRecord> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        if patch.violates_quota(&record) {
            return Err(AppError::validation(
                "max_downloads cannot be lower than the current download count",
            ));
        }
        patch.apply_to(&mut record, Utc::now());
        Ok(record.clone())
    }

    async fn revoke(&self, id: ShareId) -> AppResult<bool> {
        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(false);
        };
        if record.is_revoked() {
            return Ok(false);
        }
        let now = Utc::now();
        record.revoked_at = Some(now);
        record.updated_at = now;
        Ok(true)
    }
}

/// In-memory file catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileCatalog {
    files: Arc<DashMap<FileId, FileDescriptor>>,
}

impl MemoryFileCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileCatalog for MemoryFileCatalog {
    async fn register(&self, file: FileDescriptor) -> AppResult<FileDescriptor> {
        match self.files.entry(file.id) {
            Entry::Occupied(_) => Err(AppError::conflict("File already registered")),
            Entry::Vacant(slot) => Ok(slot.insert(file).value().clone()),
        }
    }

    async fn find_by_id(&self, id: FileId) -> AppResult<Option<FileDescriptor>> {
        Ok(self.files.get(&id).map(|file| file.clone()))
    }

    async fn list_by_owner(&self, owner_id: UserId) -> AppResult<Vec<FileDescriptor>> {
        let mut files: Vec<FileDescriptor> = self
            .files
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }
}

/// In-memory access log.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessLogStore {
    entries: Arc<Mutex<Vec<ShareAccessLog>>>,
}

impl MemoryAccessLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry with an explicit timestamp.
    pub async fn append_at(&self, entry: NewAccessLog, at: DateTime<Utc>) -> ShareAccessLog {
        let log = entry.into_log(at);
        self.entries.lock().await.push(log.clone());
        log
    }
}

#[async_trait]
impl AccessLogStore for MemoryAccessLogStore {
    async fn append(&self, entry: NewAccessLog) -> AppResult<ShareAccessLog> {
        Ok(self.append_at(entry, Utc::now()).await)
    }

    async fn stats(
        &self,
        share_id: ShareId,
        recent_since: DateTime<Utc>,
    ) -> AppResult<AccessStats> {
        let entries = self.entries.lock().await;
        let mut stats = AccessStats::default();
        let mut ips = HashSet::new();
        for entry in entries.iter().filter(|e| e.share_id == share_id) {
            stats.total_attempts += 1;
            if entry.success {
                stats.successful_attempts += 1;
            } else {
                stats.failed_attempts += 1;
            }
            if entry.attempted_at >= recent_since {
                stats.recent_attempts += 1;
            }
            ips.insert(entry.ip_address.as_str());
        }
        stats.unique_ips = ips.len() as i64;
        Ok(stats)
    }

    async fn recent(&self, share_id: ShareId, limit: i64) -> AppResult<Vec<ShareAccessLog>> {
        let entries = self.entries.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.share_id == share_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.attempted_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
