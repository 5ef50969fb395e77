#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tiered_shortener::application::services::{UrlService, UrlServiceSettings};
use tiered_shortener::codegen::{Counter, CounterGenerator, GeneratorError};
use tiered_shortener::domain::entities::{NewUrlRecord, UrlRecord};
use tiered_shortener::domain::repositories::{RepositoryError, UrlRepository};
use tiered_shortener::infrastructure::cache::{CacheError, CacheResult, RemoteCache};
use tiered_shortener::state::AppState;
use tiered_shortener::telemetry::{MetricsRecorder, NoopMetrics};

/// In-memory URL store that counts lookups.
#[derive(Default)]
pub struct InMemoryUrlRepository {
    rows: Mutex<HashMap<String, UrlRecord>>,
    next_id: AtomicU64,
    finds: AtomicUsize,
    healthy: Mutex<bool>,
}

impl InMemoryUrlRepository {
    pub fn new() -> Self {
        Self {
            healthy: Mutex::new(true),
            ..Default::default()
        }
    }

    pub fn insert(&self, record: NewUrlRecord) -> UrlRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let record = record.into_record(id);
        self.rows
            .lock()
            .insert(record.short_code.clone(), record.clone());
        record
    }

    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock() = healthy;
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn save(&self, record: NewUrlRecord) -> Result<UrlRecord, RepositoryError> {
        if self.rows.lock().contains_key(&record.short_code) {
            return Err(RepositoryError::Duplicate {
                code: record.short_code,
            });
        }
        Ok(self.insert(record))
    }

    async fn find_by_short_code(&self, code: &str) -> Result<Option<UrlRecord>, RepositoryError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        Ok(self
            .rows
            .lock()
            .get(code)
            .filter(|r| r.is_live_at(now))
            .cloned())
    }

    async fn exists_by_short_code(&self, code: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.lock().contains_key(code))
    }

    async fn delete_by_short_code(&self, code: &str) -> Result<(), RepositoryError> {
        match self.rows.lock().remove(code) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound {
                code: code.to_string(),
            }),
        }
    }

    async fn health_check(&self) -> bool {
        *self.healthy.lock()
    }
}

/// In-memory remote cache keyed by logical key.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

#[async_trait]
impl RemoteCache for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<String> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or(CacheError::Miss)
    }

    async fn set(&self, key: &str, value: String, _ttl: Option<Duration>) -> CacheResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.contains(key))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Process-local stand-in for the Redis counter.
#[derive(Default)]
pub struct LocalCounter(AtomicU64);

#[async_trait]
impl Counter for LocalCounter {
    async fn increment(&self, _key: &str) -> Result<u64, GeneratorError> {
        // start high enough that generated codes are at least 4 characters
        Ok(self.0.fetch_add(1, Ordering::SeqCst) + 238_328)
    }
}

pub struct TestContext {
    pub state: AppState,
    pub repository: Arc<InMemoryUrlRepository>,
    pub cache: Arc<InMemoryCache>,
}

pub fn create_test_context() -> TestContext {
    create_test_context_with_metrics(NoopMetrics::arc())
}

pub fn create_test_context_with_metrics(metrics: Arc<dyn MetricsRecorder>) -> TestContext {
    let repository = Arc::new(InMemoryUrlRepository::new());
    let cache = Arc::new(InMemoryCache::default());

    let service = UrlService::new(
        repository.clone(),
        Arc::new(CounterGenerator::new(LocalCounter::default())),
        cache.clone(),
        metrics.clone(),
        UrlServiceSettings {
            local_capacity: 100,
            base_url: Some("http://localhost:8080".to_string()),
        },
    );

    TestContext {
        state: AppState::new(Arc::new(service), metrics),
        repository,
        cache,
    }
}
