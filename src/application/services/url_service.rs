//! Short URL creation, layered lookup and deletion.

use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codegen::{CodeGenerator, GeneratorError};
use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{RepositoryError, UrlRepository};
use crate::infrastructure::cache::{
    CacheEntry, CacheError, LruCache, RemoteCache, get_json, set_json, url_key,
};
use crate::telemetry::{LAYER_L1, LAYER_L2, MetricsRecorder};
use crate::utils::validation::{validate_custom_code, validate_long_url};

/// Generate-and-save iterations before a generated-code shorten gives up.
pub const MAX_ATTEMPTS: u32 = 6;

/// Remote TTL for entries written right after a shorten.
const WRITE_TTL: Duration = Duration::from_secs(60 * 60);

/// Remote TTL for negative entries.
const TOMBSTONE_TTL: Duration = Duration::from_secs(60);

/// Remote TTL for records created within the last hour.
const FRESH_TTL: Duration = Duration::from_secs(2 * 60);

/// Remote TTL for older records.
const STEADY_TTL: Duration = Duration::from_secs(5 * 60);

/// Errors returned by [`UrlService`].
#[derive(Debug, Error)]
pub enum UrlServiceError {
    /// The long URL or custom code failed validation.
    #[error("{0}")]
    InvalidUrl(String),

    #[error("custom code '{0}' is already taken")]
    CustomCodeTaken(String),

    #[error("short code '{0}' not found")]
    NotFound(String),

    #[error("short code '{0}' has expired")]
    Expired(String),

    #[error("could not allocate a unique short code after {0} attempts")]
    GenExhausted(u32),

    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Input for [`UrlService::shorten`].
#[derive(Debug, Clone, Default)]
pub struct NewShortUrl {
    pub long_url: String,
    pub custom_code: Option<String>,
}

/// Result of a successful shorten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedUrl {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
}

/// Reachability of the service's backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub database: bool,
    pub cache: bool,
}

/// Tunables for [`UrlService`].
#[derive(Debug, Clone)]
pub struct UrlServiceSettings {
    /// Capacity of the in-process LRU.
    pub local_capacity: usize,
    /// Prefix for short URLs. `None` returns the bare code.
    pub base_url: Option<String>,
}

impl Default for UrlServiceSettings {
    fn default() -> Self {
        Self {
            local_capacity: 10_000,
            base_url: Some("http://localhost:8080".to_string()),
        }
    }
}

/// Core URL service.
///
/// Reads go through the local LRU, then the remote cache, then the store,
/// populating the faster layers on the way back. Both layers hold
/// [`CacheEntry`] values, so unknown codes are cached as tombstones.
///
/// Local writes happen before a call returns, giving read-your-writes on one
/// instance. Remote writes run on detached tasks and are never awaited by the
/// caller; their failures are only logged.
pub struct UrlService {
    repository: Arc<dyn UrlRepository>,
    generator: Arc<dyn CodeGenerator>,
    local: LruCache<CacheEntry>,
    remote: Arc<dyn RemoteCache>,
    metrics: Arc<dyn MetricsRecorder>,
    base_url: Option<String>,
}

impl UrlService {
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        generator: Arc<dyn CodeGenerator>,
        remote: Arc<dyn RemoteCache>,
        metrics: Arc<dyn MetricsRecorder>,
        settings: UrlServiceSettings,
    ) -> Self {
        let base_url = settings
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Self {
            repository,
            generator,
            local: LruCache::new(settings.local_capacity),
            remote,
            metrics,
            base_url,
        }
    }

    /// Creates a short URL.
    ///
    /// With a custom code, the code is checked for availability and saved
    /// once. Without one, codes are drawn from the generator until a save
    /// succeeds, retrying on duplicate-key up to [`MAX_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// - [`UrlServiceError::InvalidUrl`] for a bad long URL or custom code
    /// - [`UrlServiceError::CustomCodeTaken`] if the custom code exists
    /// - [`UrlServiceError::GenExhausted`] if every generated code collided
    /// - [`UrlServiceError::Store`] / [`UrlServiceError::Generator`] on backend failure
    pub async fn shorten(&self, request: NewShortUrl) -> Result<ShortenedUrl, UrlServiceError> {
        let NewShortUrl {
            long_url,
            custom_code,
        } = request;

        validate_long_url(&long_url).map_err(UrlServiceError::InvalidUrl)?;

        let custom_code = custom_code.filter(|code| !code.is_empty());

        let record = match custom_code {
            Some(code) => {
                validate_custom_code(&code).map_err(UrlServiceError::InvalidUrl)?;
                self.save_custom(code, long_url).await?
            }
            None => self.save_generated(&long_url).await?,
        };

        info!("Shortened {} -> {}", record.long_url, record.short_code);

        self.populate(&record.short_code, CacheEntry::hit(record.clone()), WRITE_TTL);

        Ok(ShortenedUrl {
            short_url: self.short_url(&record.short_code),
            short_code: record.short_code,
            long_url: record.long_url,
        })
    }

    async fn save_custom(&self, code: String, long_url: String) -> Result<UrlRecord, UrlServiceError> {
        let taken = self
            .timed("exists_by_short_code", self.repository.exists_by_short_code(&code))
            .await?;
        if taken {
            return Err(UrlServiceError::CustomCodeTaken(code));
        }

        match self
            .timed("save", self.repository.save(NewUrlRecord::now(&code, long_url)))
            .await
        {
            Ok(record) => Ok(record),
            Err(e) if e.is_duplicate() => Err(UrlServiceError::CustomCodeTaken(code)),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_generated(&self, long_url: &str) -> Result<UrlRecord, UrlServiceError> {
        for attempt in 0..MAX_ATTEMPTS {
            let code = self.generator.generate(long_url, attempt).await?;

            if code.is_empty() {
                warn!("Generator returned an empty code (attempt {})", attempt + 1);
                continue;
            }

            match self
                .timed("save", self.repository.save(NewUrlRecord::now(&code, long_url)))
                .await
            {
                Ok(record) => return Ok(record),
                Err(e) if e.is_duplicate() => {
                    warn!(
                        "Short code collision on '{}' (attempt {}/{})",
                        code,
                        attempt + 1,
                        MAX_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(UrlServiceError::GenExhausted(MAX_ATTEMPTS))
    }

    /// Resolves a short code to its long URL.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub async fn get_long_url(&self, short_code: &str) -> Result<String, UrlServiceError> {
        self.resolve(short_code).await.map(|record| record.long_url)
    }

    /// Resolves a short code to its live record.
    ///
    /// Remote cache failures degrade to a store read and are logged at warn.
    ///
    /// # Errors
    ///
    /// - [`UrlServiceError::NotFound`] if the code does not exist (cached as a tombstone)
    /// - [`UrlServiceError::Expired`] if a cached record is past its expiry;
    ///   both layers are invalidated
    /// - [`UrlServiceError::Store`] on database errors
    pub async fn resolve(&self, short_code: &str) -> Result<UrlRecord, UrlServiceError> {
        if short_code.is_empty() {
            return Err(UrlServiceError::NotFound(String::new()));
        }

        if let Some(entry) = self.local.get(short_code) {
            debug!("L1 HIT: {}", short_code);
            self.metrics.inc_cache_hit(LAYER_L1);
            return self.check_cached(short_code, entry).await;
        }
        self.metrics.inc_cache_miss(LAYER_L1);

        let key = url_key(short_code);
        match get_json::<CacheEntry>(self.remote.as_ref(), &key).await {
            Ok(entry) => {
                debug!("L2 HIT: {}", short_code);
                self.metrics.inc_cache_hit(LAYER_L2);

                if let CacheEntry::Hit { record } = &entry
                    && record.is_expired_at(Utc::now())
                {
                    return self.expire(short_code).await;
                }

                self.put_local(short_code, entry.clone());
                return self.check_cached(short_code, entry).await;
            }
            Err(CacheError::Miss) => {
                self.metrics.inc_cache_miss(LAYER_L2);
            }
            Err(e) => {
                warn!("Remote cache read failed for {}: {}", key, e);
                self.metrics.inc_cache_miss(LAYER_L2);
            }
        }

        let found = self
            .timed(
                "find_by_short_code",
                self.repository.find_by_short_code(short_code),
            )
            .await?;

        let Some(record) = found else {
            debug!("Store MISS: {}, caching tombstone", short_code);
            self.put_local(short_code, CacheEntry::Tombstone);
            self.spawn_remote_set(short_code, CacheEntry::Tombstone, TOMBSTONE_TTL);
            return Err(UrlServiceError::NotFound(short_code.to_string()));
        };

        let now = Utc::now();
        if record.is_expired_at(now) {
            return Err(UrlServiceError::Expired(short_code.to_string()));
        }

        let ttl = positive_ttl(&record, now);
        self.populate(short_code, CacheEntry::hit(record.clone()), ttl);

        Ok(record)
    }

    async fn check_cached(
        &self,
        short_code: &str,
        entry: CacheEntry,
    ) -> Result<UrlRecord, UrlServiceError> {
        match entry {
            CacheEntry::Tombstone => Err(UrlServiceError::NotFound(short_code.to_string())),
            CacheEntry::Hit { record } if record.is_expired_at(Utc::now()) => {
                self.expire(short_code).await
            }
            CacheEntry::Hit { record } => Ok(record),
        }
    }

    async fn expire(&self, short_code: &str) -> Result<UrlRecord, UrlServiceError> {
        debug!("Cached record expired: {}", short_code);
        self.invalidate(short_code).await;
        Err(UrlServiceError::Expired(short_code.to_string()))
    }

    /// Deletes a short code and invalidates both cache layers.
    ///
    /// Caches are invalidated even when the store reports the code missing.
    ///
    /// # Errors
    ///
    /// - [`UrlServiceError::NotFound`] if no record had this code
    /// - [`UrlServiceError::Store`] on database errors
    pub async fn delete(&self, short_code: &str) -> Result<(), UrlServiceError> {
        let result = self
            .timed(
                "delete_by_short_code",
                self.repository.delete_by_short_code(short_code),
            )
            .await;

        self.invalidate(short_code).await;

        match result {
            Ok(()) => {
                info!("Deleted short code {}", short_code);
                Ok(())
            }
            Err(RepositoryError::NotFound { code }) => Err(UrlServiceError::NotFound(code)),
            Err(e) => Err(e.into()),
        }
    }

    /// Reports whether the store and remote cache answer.
    pub async fn health(&self) -> HealthReport {
        let (database, cache) =
            tokio::join!(self.repository.health_check(), self.remote.health_check());

        HealthReport { database, cache }
    }

    /// Builds the public short URL for `short_code`.
    pub fn short_url(&self, short_code: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}/{}", base, short_code),
            None => short_code.to_string(),
        }
    }

    /// Removes `short_code` from both layers. Remote failures are logged only.
    async fn invalidate(&self, short_code: &str) {
        if self.local.delete(short_code) {
            self.metrics
                .set_cache_entries(LAYER_L1, self.local.len() as f64);
        }

        let key = url_key(short_code);
        if let Err(e) = self.remote.delete(&key).await {
            warn!("Failed to invalidate remote cache for {}: {}", key, e);
        }
    }

    fn populate(&self, short_code: &str, entry: CacheEntry, ttl: Duration) {
        self.put_local(short_code, entry.clone());
        self.spawn_remote_set(short_code, entry, ttl);
    }

    fn put_local(&self, short_code: &str, entry: CacheEntry) {
        if let Some((evicted, _)) = self.local.put(short_code, entry) {
            debug!("L1 evicted: {}", evicted);
        }
        self.metrics
            .set_cache_entries(LAYER_L1, self.local.len() as f64);
    }

    /// Writes `entry` to the remote cache on a detached task.
    ///
    /// The task does not observe the caller's cancellation: it keeps running
    /// after the request that triggered it has completed or been dropped.
    fn spawn_remote_set(&self, short_code: &str, entry: CacheEntry, ttl: Duration) {
        let remote = Arc::clone(&self.remote);
        let key = url_key(short_code);

        tokio::spawn(async move {
            if let Err(e) = set_json(remote.as_ref(), &key, &entry, Some(ttl)).await {
                warn!("Failed to populate remote cache for {}: {}", key, e);
            }
        });
    }

    async fn timed<T>(&self, operation: &str, query: impl Future<Output = T>) -> T {
        let start = Instant::now();
        let result = query.await;
        self.metrics
            .observe_db_query(operation, start.elapsed().as_secs_f64());
        result
    }
}

/// Remote TTL for a live record read from the store.
///
/// A record expiring within the hour is cached until its expiry. Otherwise
/// records younger than an hour get a short TTL and older ones the steady TTL.
pub fn positive_ttl(record: &UrlRecord, now: DateTime<Utc>) -> Duration {
    let one_hour = TimeDelta::hours(1);

    if let Some(expires_at) = record.expires_at {
        let remaining = expires_at - now;
        if remaining > TimeDelta::zero()
            && remaining < one_hour
            && let Ok(ttl) = remaining.to_std()
        {
            return ttl;
        }
    }

    if now - record.created_at < one_hour {
        FRESH_TTL
    } else {
        STEADY_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUrlRepository;
    use crate::infrastructure::cache::CacheResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
    }

    impl MemoryCache {
        fn raw(&self, key: &str) -> Option<(String, Option<Duration>)> {
            self.entries.lock().get(key).cloned()
        }

        fn entry(&self, key: &str) -> Option<CacheEntry> {
            self.raw(key)
                .map(|(value, _)| serde_json::from_str(&value).unwrap())
        }

        fn insert(&self, key: &str, entry: &CacheEntry) {
            self.entries.lock().insert(
                key.to_string(),
                (serde_json::to_string(entry).unwrap(), None),
            );
        }
    }

    #[async_trait]
    impl RemoteCache for MemoryCache {
        async fn get(&self, key: &str) -> CacheResult<String> {
            self.raw(key).map(|(v, _)| v).ok_or(CacheError::Miss)
        }

        async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
            self.entries.lock().insert(key.to_string(), (value, ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.entries.lock().remove(key);
            Ok(())
        }

        async fn exists(&self, key: &str) -> CacheResult<bool> {
            Ok(self.entries.lock().contains_key(key))
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl RemoteCache for BrokenCache {
        async fn get(&self, _key: &str) -> CacheResult<String> {
            Err(CacheError::Operation("connection reset".to_string()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> CacheResult<()> {
            Err(CacheError::Operation("connection reset".to_string()))
        }

        async fn delete(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::Timeout(Duration::from_millis(10)))
        }

        async fn exists(&self, _key: &str) -> CacheResult<bool> {
            Err(CacheError::Operation("connection reset".to_string()))
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    /// Returns the queued codes in order, then repeats the last one.
    struct ScriptedGenerator {
        codes: Mutex<VecDeque<String>>,
        last: Mutex<String>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(codes: &[&str]) -> Self {
            Self {
                codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
                last: Mutex::new(String::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CodeGenerator for ScriptedGenerator {
        async fn generate(&self, _long_url: &str, _attempt: u32) -> Result<String, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut last = self.last.lock();
            if let Some(code) = self.codes.lock().pop_front() {
                *last = code;
            }
            Ok(last.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl CodeGenerator for FailingGenerator {
        async fn generate(&self, _long_url: &str, _attempt: u32) -> Result<String, GeneratorError> {
            Err(GeneratorError::Counter("redis down".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingMetrics {
        counts: Mutex<HashMap<String, u64>>,
    }

    impl CountingMetrics {
        fn get(&self, name: &str) -> u64 {
            self.counts.lock().get(name).copied().unwrap_or(0)
        }

        fn bump(&self, name: String) {
            *self.counts.lock().entry(name).or_default() += 1;
        }
    }

    impl MetricsRecorder for CountingMetrics {
        fn inc_cache_hit(&self, layer: &str) {
            self.bump(format!("hit:{layer}"));
        }

        fn inc_cache_miss(&self, layer: &str) {
            self.bump(format!("miss:{layer}"));
        }

        fn observe_db_query(&self, operation: &str, _duration_secs: f64) {
            self.bump(format!("db:{operation}"));
        }
    }

    struct Fixture {
        service: UrlService,
        remote: Arc<MemoryCache>,
        metrics: Arc<CountingMetrics>,
    }

    fn fixture(repo: MockUrlRepository, generator: Arc<dyn CodeGenerator>) -> Fixture {
        let remote = Arc::new(MemoryCache::default());
        let metrics = Arc::new(CountingMetrics::default());
        let service = UrlService::new(
            Arc::new(repo),
            generator,
            remote.clone(),
            metrics.clone(),
            UrlServiceSettings::default(),
        );

        Fixture {
            service,
            remote,
            metrics,
        }
    }

    fn record(code: &str, url: &str) -> UrlRecord {
        UrlRecord::new(1, code.to_string(), url.to_string(), Utc::now(), None)
    }

    fn saved(new: NewUrlRecord) -> Result<UrlRecord, RepositoryError> {
        Ok(new.into_record(1))
    }

    fn duplicate(new: &NewUrlRecord) -> RepositoryError {
        RepositoryError::Duplicate {
            code: new.short_code.clone(),
        }
    }

    fn request(url: &str, custom: Option<&str>) -> NewShortUrl {
        NewShortUrl {
            long_url: url.to_string(),
            custom_code: custom.map(str::to_string),
        }
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_shorten_generated_code() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save()
            .withf(|new| new.short_code == "abc" && new.long_url == "https://example.com/a")
            .times(1)
            .returning(saved);

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["abc"])));

        let result = f
            .service
            .shorten(request("https://example.com/a", None))
            .await
            .unwrap();

        assert_eq!(result.short_code, "abc");
        assert_eq!(result.short_url, "http://localhost:8080/abc");
        assert_eq!(result.long_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_read_your_writes_skips_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save().times(1).returning(saved);
        repo.expect_find_by_short_code().times(0);

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["abc"])));

        let created = f
            .service
            .shorten(request("https://example.com/a", None))
            .await
            .unwrap();
        let long_url = f.service.get_long_url(&created.short_code).await.unwrap();

        assert_eq!(long_url, "https://example.com/a");
        assert_eq!(f.metrics.get("hit:l1"), 1);
    }

    #[tokio::test]
    async fn test_shorten_populates_remote_with_one_hour_ttl() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save().returning(saved);

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["abc"])));
        f.service
            .shorten(request("https://example.com/a", None))
            .await
            .unwrap();

        let remote = f.remote.clone();
        eventually(|| remote.raw("url:abc").is_some()).await;

        let (_, ttl) = f.remote.raw("url:abc").unwrap();
        assert_eq!(ttl, Some(Duration::from_secs(3600)));
        assert!(matches!(
            f.remote.entry("url:abc"),
            Some(CacheEntry::Hit { .. })
        ));
    }

    #[tokio::test]
    async fn test_shorten_retries_on_collision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut repo = MockUrlRepository::new();
        let counter = calls.clone();
        repo.expect_save().times(2).returning(move |new| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(duplicate(&new))
            } else {
                saved(new)
            }
        });

        let generator = Arc::new(ScriptedGenerator::new(&["same", "other"]));
        let f = fixture(repo, generator.clone());

        let result = f
            .service
            .shorten(request("https://example.com", None))
            .await
            .unwrap();

        assert_eq!(result.short_code, "other");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shorten_exhausts_attempts() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save()
            .times(MAX_ATTEMPTS as usize)
            .returning(|new| Err(duplicate(&new)));

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["same"])));

        let err = f
            .service
            .shorten(request("https://example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UrlServiceError::GenExhausted(6)));
    }

    #[tokio::test]
    async fn test_shorten_aborts_on_store_error() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save()
            .times(1)
            .returning(|_| Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)));

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["abc"])));

        let err = f
            .service
            .shorten(request("https://example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UrlServiceError::Store(_)));
    }

    #[tokio::test]
    async fn test_shorten_aborts_on_generator_error() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));

        let err = f
            .service
            .shorten(request("https://example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UrlServiceError::Generator(_)));
    }

    #[tokio::test]
    async fn test_empty_generated_code_is_skipped() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save()
            .withf(|new| new.short_code == "abc")
            .times(1)
            .returning(saved);

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["", "abc"])));

        let result = f
            .service
            .shorten(request("https://example.com", None))
            .await
            .unwrap();

        assert_eq!(result.short_code, "abc");
    }

    #[tokio::test]
    async fn test_custom_code_taken_by_precheck() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists_by_short_code()
            .withf(|code| code == "hello")
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_save().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));

        let err = f
            .service
            .shorten(request("https://example.com", Some("hello")))
            .await
            .unwrap_err();

        assert!(matches!(err, UrlServiceError::CustomCodeTaken(code) if code == "hello"));
    }

    #[tokio::test]
    async fn test_custom_code_race_maps_to_taken() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists_by_short_code()
            .times(1)
            .returning(|_| Ok(false));
        repo.expect_save()
            .times(1)
            .returning(|new| Err(duplicate(&new)));

        let f = fixture(repo, Arc::new(FailingGenerator));

        let err = f
            .service
            .shorten(request("https://example.com", Some("hello")))
            .await
            .unwrap_err();

        assert!(matches!(err, UrlServiceError::CustomCodeTaken(_)));
    }

    #[tokio::test]
    async fn test_custom_code_success_skips_generator() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists_by_short_code().returning(|_| Ok(false));
        repo.expect_save()
            .withf(|new| new.short_code == "hello")
            .times(1)
            .returning(saved);

        let f = fixture(repo, Arc::new(FailingGenerator));

        let result = f
            .service
            .shorten(request("https://example.com", Some("hello")))
            .await
            .unwrap();

        assert_eq!(result.short_code, "hello");
    }

    #[tokio::test]
    async fn test_empty_custom_code_uses_generator() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists_by_short_code().times(0);
        repo.expect_save().times(1).returning(saved);

        let f = fixture(repo, Arc::new(ScriptedGenerator::new(&["gen1"])));

        let result = f
            .service
            .shorten(request("https://example.com", Some("")))
            .await
            .unwrap();

        assert_eq!(result.short_code, "gen1");
    }

    #[tokio::test]
    async fn test_validation_failures_do_not_touch_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_save().times(0);
        repo.expect_exists_by_short_code().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));

        for (url, custom) in [
            ("ftp://x", None),
            ("not a url", None),
            ("https://example.com", Some("api")),
            ("https://example.com", Some("Admin")),
            ("https://example.com", Some("12345")),
        ] {
            let err = f.service.shorten(request(url, custom)).await.unwrap_err();
            assert!(matches!(err, UrlServiceError::InvalidUrl(_)), "{url} {custom:?}");
        }
    }

    #[tokio::test]
    async fn test_unknown_code_is_tombstoned() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code()
            .times(1)
            .returning(|_| Ok(None));

        let f = fixture(repo, Arc::new(FailingGenerator));

        for _ in 0..2 {
            let err = f.service.get_long_url("nope").await.unwrap_err();
            assert!(matches!(err, UrlServiceError::NotFound(_)));
        }

        let remote = f.remote.clone();
        eventually(|| remote.entry("url:nope").is_some()).await;

        assert_eq!(f.remote.entry("url:nope"), Some(CacheEntry::Tombstone));
        assert_eq!(f.remote.raw("url:nope").unwrap().1, Some(TOMBSTONE_TTL));
    }

    #[tokio::test]
    async fn test_empty_code_is_not_found() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));

        assert!(matches!(
            f.service.get_long_url("").await,
            Err(UrlServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_hit_populates_local() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));
        f.remote.insert(
            "url:abc",
            &CacheEntry::hit(record("abc", "https://example.com/r")),
        );

        assert_eq!(
            f.service.get_long_url("abc").await.unwrap(),
            "https://example.com/r"
        );
        assert_eq!(f.metrics.get("hit:l2"), 1);

        f.remote.entries.lock().clear();

        assert_eq!(
            f.service.get_long_url("abc").await.unwrap(),
            "https://example.com/r"
        );
        assert_eq!(f.metrics.get("hit:l1"), 1);
    }

    #[tokio::test]
    async fn test_remote_tombstone_is_not_found() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));
        f.remote.insert("url:gone", &CacheEntry::Tombstone);

        assert!(matches!(
            f.service.get_long_url("gone").await,
            Err(UrlServiceError::NotFound(_))
        ));
        assert!(f.service.local.contains("gone"));
    }

    #[tokio::test]
    async fn test_store_hit_populates_both_layers() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code()
            .withf(|code| code == "abc")
            .times(1)
            .returning(|_| Ok(Some(record("abc", "https://example.com/s"))));

        let f = fixture(repo, Arc::new(FailingGenerator));

        assert_eq!(
            f.service.get_long_url("abc").await.unwrap(),
            "https://example.com/s"
        );
        assert_eq!(
            f.service.get_long_url("abc").await.unwrap(),
            "https://example.com/s"
        );

        let remote = f.remote.clone();
        eventually(|| remote.raw("url:abc").is_some()).await;

        assert_eq!(f.remote.raw("url:abc").unwrap().1, Some(FRESH_TTL));
        assert_eq!(f.metrics.get("db:find_by_short_code"), 1);
    }

    #[tokio::test]
    async fn test_expired_local_entry_invalidates_both_layers() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));

        let mut stale = record("old", "https://example.com");
        stale.expires_at = Some(Utc::now() - TimeDelta::seconds(1));
        let entry = CacheEntry::hit(stale);
        f.service.local.put("old", entry.clone());
        f.remote.insert("url:old", &entry);

        let err = f.service.get_long_url("old").await.unwrap_err();

        assert!(matches!(err, UrlServiceError::Expired(_)));
        assert!(!f.service.local.contains("old"));
        assert!(f.remote.raw("url:old").is_none());
    }

    #[tokio::test]
    async fn test_expired_remote_entry_invalidates_and_skips_local() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code().times(0);

        let f = fixture(repo, Arc::new(FailingGenerator));

        let mut stale = record("old", "https://example.com");
        stale.expires_at = Some(Utc::now() - TimeDelta::seconds(1));
        f.remote.insert("url:old", &CacheEntry::hit(stale));

        let err = f.service.get_long_url("old").await.unwrap_err();

        assert!(matches!(err, UrlServiceError::Expired(_)));
        assert!(!f.service.local.contains("old"));
        assert!(f.remote.raw("url:old").is_none());
    }

    #[tokio::test]
    async fn test_expired_store_row_is_rejected() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code().times(1).returning(|_| {
            let mut stale = record("old", "https://example.com");
            stale.expires_at = Some(Utc::now() - TimeDelta::seconds(1));
            Ok(Some(stale))
        });

        let f = fixture(repo, Arc::new(FailingGenerator));

        assert!(matches!(
            f.service.get_long_url("old").await,
            Err(UrlServiceError::Expired(_))
        ));
        assert!(!f.service.local.contains("old"));
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_store() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_short_code()
            .times(1)
            .returning(|_| Ok(Some(record("abc", "https://example.com"))));

        let service = UrlService::new(
            Arc::new(repo),
            Arc::new(FailingGenerator),
            Arc::new(BrokenCache),
            Arc::new(CountingMetrics::default()),
            UrlServiceSettings::default(),
        );

        assert_eq!(
            service.get_long_url("abc").await.unwrap(),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn test_delete_invalidates_caches() {
        let mut repo = MockUrlRepository::new();
        repo.expect_delete_by_short_code()
            .withf(|code| code == "abc")
            .times(1)
            .returning(|_| Ok(()));

        let f = fixture(repo, Arc::new(FailingGenerator));
        let entry = CacheEntry::hit(record("abc", "https://example.com"));
        f.service.local.put("abc", entry.clone());
        f.remote.insert("url:abc", &entry);

        f.service.delete("abc").await.unwrap();

        assert!(!f.service.local.contains("abc"));
        assert!(f.remote.raw("url:abc").is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_still_invalidates() {
        let mut repo = MockUrlRepository::new();
        repo.expect_delete_by_short_code().times(1).returning(|code| {
            Err(RepositoryError::NotFound {
                code: code.to_string(),
            })
        });

        let f = fixture(repo, Arc::new(FailingGenerator));
        f.service.local.put("abc", CacheEntry::Tombstone);

        let err = f.service.delete("abc").await.unwrap_err();

        assert!(matches!(err, UrlServiceError::NotFound(code) if code == "abc"));
        assert!(!f.service.local.contains("abc"));
    }

    #[tokio::test]
    async fn test_health_reports_each_backend() {
        let mut repo = MockUrlRepository::new();
        repo.expect_health_check().returning(|| true);

        let service = UrlService::new(
            Arc::new(repo),
            Arc::new(FailingGenerator),
            Arc::new(BrokenCache),
            Arc::new(CountingMetrics::default()),
            UrlServiceSettings::default(),
        );

        assert_eq!(
            service.health().await,
            HealthReport {
                database: true,
                cache: false
            }
        );
    }

    #[test]
    fn test_short_url_with_and_without_base() {
        let build = |base_url: Option<&str>| {
            UrlService::new(
                Arc::new(MockUrlRepository::new()),
                Arc::new(FailingGenerator),
                Arc::new(MemoryCache::default()),
                Arc::new(CountingMetrics::default()),
                UrlServiceSettings {
                    local_capacity: 10,
                    base_url: base_url.map(str::to_string),
                },
            )
        };

        assert_eq!(build(Some("https://s.io/")).short_url("abc"), "https://s.io/abc");
        assert_eq!(build(Some("")).short_url("abc"), "abc");
        assert_eq!(build(None).short_url("abc"), "abc");
    }

    #[test]
    fn test_positive_ttl_rules() {
        let now = Utc::now();

        let mut expiring = record("a", "https://example.com");
        expiring.expires_at = Some(now + TimeDelta::minutes(10));
        assert_eq!(positive_ttl(&expiring, now), Duration::from_secs(600));

        let fresh = record("b", "https://example.com");
        assert_eq!(positive_ttl(&fresh, now), FRESH_TTL);

        let mut old = record("c", "https://example.com");
        old.created_at = now - TimeDelta::hours(3);
        assert_eq!(positive_ttl(&old, now), STEADY_TTL);

        let mut far_expiry = old.clone();
        far_expiry.expires_at = Some(now + TimeDelta::days(1));
        assert_eq!(positive_ttl(&far_expiry, now), STEADY_TTL);
    }
}
