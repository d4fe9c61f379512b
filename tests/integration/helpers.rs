//! Shared wiring for the share integration tests.
//!
//! Everything runs over the in-memory stores, cache, and limiter with a
//! low PBKDF2 work factor so the suite stays fast.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use aegis_auth::limiter::build_limiter;
use aegis_auth::{AttemptLimiter, CatalogOwnershipChecker, RequestThrottle, SharePasswordPolicy};
use aegis_cache::memory::MemoryCacheProvider;
use aegis_core::config::cache::MemoryCacheConfig;
use aegis_core::config::{LimiterConfig, ShareConfig, ThrottleConfig};
use aegis_core::result::AppResult;
use aegis_core::traits::cache::CacheProvider;
use aegis_core::types::{FileId, ShareId, UserId};
use aegis_crypto::{EnvelopeCodec, FileKey};
use aegis_database::memory::{MemoryAccessLogStore, MemoryFileCatalog, MemoryShareStore};
use aegis_database::store::{FileCatalog, ShareStore};
use aegis_entity::access::AccessAttempt;
use aegis_entity::file::FileDescriptor;
use aegis_entity::share::{NewShare, ShareFilter, SharePatch, ShareRecord};
use aegis_service::{
    AccessService, CreateShareRequest, LinkService, ProvidedFileKey, RequestContext, ShareService,
};

pub const PASSWORD: &str = "Str0ng!Pass1234";
pub const WRONG_PASSWORD: &str = "Wr0ng!Pass12345";
pub const BASE_URL: &str = "http://localhost:8080";
pub const TEST_ITERATIONS: u32 = 1_000;

pub fn codec() -> EnvelopeCodec {
    EnvelopeCodec::new(TEST_ITERATIONS)
}

pub fn attempt() -> AccessAttempt {
    attempt_from("203.0.113.7")
}

pub fn attempt_from(ip: &str) -> AccessAttempt {
    AccessAttempt::new(ip, "integration-test")
}

/// Loose enough that only throttle tests ever hit it.
pub fn relaxed_throttle() -> ThrottleConfig {
    ThrottleConfig {
        max_requests: 1_000,
        window_seconds: 60,
    }
}

/// A share store that counts token lookups.
#[derive(Debug, Default)]
pub struct CountingShareStore {
    pub inner: MemoryShareStore,
    lookups: AtomicUsize,
}

impl CountingShareStore {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShareStore for CountingShareStore {
    async fn create(&self, share: NewShare) -> AppResult<ShareRecord> {
        self.inner.create(share).await
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_token(token).await
    }

    async fn find_by_id(&self, owner_id: UserId, id: ShareId) -> AppResult<Option<ShareRecord>> {
        self.inner.find_by_id(owner_id, id).await
    }

    async fn find_by_owner(
        &self,
        owner_id: UserId,
        filter: &ShareFilter,
    ) -> AppResult<Vec<ShareRecord>> {
        self.inner.find_by_owner(owner_id, filter).await
    }

    async fn atomic_increment_if_under_limit(&self, token: &str) -> AppResult<Option<i32>> {
        self.inner.atomic_increment_if_under_limit(token).await
    }

    async fn update(&self, id: ShareId, patch: &SharePatch) -> AppResult<ShareRecord> {
        self.inner.update(id, patch).await
    }

    async fn revoke(&self, id: ShareId) -> AppResult<bool> {
        self.inner.revoke(id).await
    }
}

/// Services wired over in-memory collaborators, with one registered file.
pub struct TestApp {
    pub shares: Arc<CountingShareStore>,
    pub files: Arc<MemoryFileCatalog>,
    pub access_logs: Arc<MemoryAccessLogStore>,
    pub cache: Arc<MemoryCacheProvider>,
    pub limiter: Arc<dyn AttemptLimiter>,
    pub links: Arc<LinkService>,
    pub access: AccessService,
    pub owner: RequestContext,
    pub file: FileDescriptor,
    pub file_key: FileKey,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_limiter(LimiterConfig::default()).await
    }

    pub async fn with_limiter(limiter: LimiterConfig) -> Self {
        Self::build(limiter, relaxed_throttle()).await
    }

    pub async fn with_throttle(throttle: ThrottleConfig) -> Self {
        Self::build(LimiterConfig::default(), throttle).await
    }

    /// `limiter.backend` picks the limiter: `"memory"` or `"cache"` over
    /// the app's in-memory cache.
    pub async fn build(limiter: LimiterConfig, throttle: ThrottleConfig) -> Self {
        let shares = Arc::new(CountingShareStore::default());
        let files = Arc::new(MemoryFileCatalog::new());
        let access_logs = Arc::new(MemoryAccessLogStore::new());
        let cache = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let shared: Arc<dyn CacheProvider> = cache.clone();
        let limiter = build_limiter(&limiter, Some(shared.clone())).expect("build limiter");
        let throttle = RequestThrottle::new(shared, &throttle);
        let links = Arc::new(LinkService::new(BASE_URL));

        let owner = RequestContext::new(UserId::new(), "owner", "198.51.100.1", None);
        let file = files
            .register(FileDescriptor {
                id: FileId::new(),
                owner_id: owner.user_id,
                filename: "quarterly.pdf".into(),
                mime_type: "application/pdf".into(),
                size_bytes: 48_213,
                created_at: Utc::now(),
            })
            .await
            .expect("register file");

        let access = AccessService::new(
            shares.clone(),
            files.clone(),
            access_logs.clone(),
            limiter.clone(),
            throttle,
            codec(),
        );

        Self {
            shares,
            files,
            access_logs,
            cache,
            limiter,
            links,
            access,
            owner,
            file,
            file_key: FileKey::generate().expect("file key"),
        }
    }

    /// Share service holding the owner's FileKey for the registered file.
    pub fn share_service(&self) -> ShareService {
        ShareService::new(
            self.shares.clone(),
            Arc::new(CatalogOwnershipChecker::new(self.files.clone())),
            Arc::new(ProvidedFileKey::for_file(self.file.id, self.file_key.clone())),
            self.links.clone(),
            SharePasswordPolicy::new(&ShareConfig::default()),
            codec(),
            ShareConfig::default().max_token_attempts,
        )
    }

    pub fn request(&self, max_downloads: i32) -> CreateShareRequest {
        CreateShareRequest {
            file_id: self.file.id,
            password: PASSWORD.to_string(),
            max_downloads,
            expires_at: None,
            allowed_usernames: None,
        }
    }

    pub async fn create_share(&self, max_downloads: i32) -> ShareRecord {
        self.share_service()
            .create_share(&self.owner, self.request(max_downloads))
            .await
            .expect("create share")
    }

    /// A second registered user who owns nothing.
    pub fn stranger(&self) -> RequestContext {
        RequestContext::new(UserId::new(), "mallory", "192.0.2.66", None)
    }
}
