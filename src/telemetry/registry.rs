//! Global metrics registry
//!
//! Defines all Prometheus metrics exported by the service.

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use tracing::error;

/// Global metrics instance
pub static METRICS: LazyLock<Metrics> = LazyLock::new(Metrics::new);

/// Latency buckets in seconds, shared by request and query histograms.
const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

/// Application metrics container
pub struct Metrics {
    registry: Registry,

    // ===== Cache metrics =====
    /// Cache hits by layer (l1, l2)
    pub cache_hits_total: CounterVec,
    /// Cache misses by layer
    pub cache_misses_total: CounterVec,
    /// Current entries by layer
    pub cache_size: GaugeVec,

    // ===== HTTP metrics =====
    pub requests_total: CounterVec,
    pub request_duration_seconds: HistogramVec,

    // ===== Database metrics =====
    pub db_query_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Builds a registry with every metric registered.
    ///
    /// The metric definitions are static, so failures here are programming errors.
    pub fn new() -> Self {
        let registry = Registry::new();

        let cache_hits_total = CounterVec::new(
            Opts::new("url_cache_hits_total", "Total cache hits by layer"),
            &["layer"],
        )
        .expect("Failed to create cache_hits_total metric");

        let cache_misses_total = CounterVec::new(
            Opts::new("url_cache_misses_total", "Total cache misses by layer"),
            &["layer"],
        )
        .expect("Failed to create cache_misses_total metric");

        let cache_size = GaugeVec::new(
            Opts::new("url_cache_size", "Current number of cache entries by layer"),
            &["layer"],
        )
        .expect("Failed to create cache_size metric");

        let requests_total = CounterVec::new(
            Opts::new("url_requests_total", "Total HTTP requests"),
            &["method", "status"],
        )
        .expect("Failed to create requests_total metric");

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("url_request_duration_seconds", "HTTP request latency")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["method", "status"],
        )
        .expect("Failed to create request_duration_seconds metric");

        let db_query_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "url_database_query_duration_seconds",
                "Database query latency by operation",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["operation"],
        )
        .expect("Failed to create db_query_duration_seconds metric");

        registry
            .register(Box::new(cache_hits_total.clone()))
            .expect("Failed to register cache_hits_total");
        registry
            .register(Box::new(cache_misses_total.clone()))
            .expect("Failed to register cache_misses_total");
        registry
            .register(Box::new(cache_size.clone()))
            .expect("Failed to register cache_size");
        registry
            .register(Box::new(requests_total.clone()))
            .expect("Failed to register requests_total");
        registry
            .register(Box::new(request_duration_seconds.clone()))
            .expect("Failed to register request_duration_seconds");
        registry
            .register(Box::new(db_query_duration_seconds.clone()))
            .expect("Failed to register db_query_duration_seconds");

        Self {
            registry,
            cache_hits_total,
            cache_misses_total,
            cache_size,
            requests_total,
            request_duration_seconds,
            db_query_duration_seconds,
        }
    }

    pub fn inc_cache_hit(&self, layer: &str) {
        self.cache_hits_total.with_label_values(&[layer]).inc();
    }

    pub fn inc_cache_miss(&self, layer: &str) {
        self.cache_misses_total.with_label_values(&[layer]).inc();
    }

    pub fn set_cache_entries(&self, layer: &str, count: f64) {
        self.cache_size.with_label_values(&[layer]).set(count);
    }

    pub fn observe_http_request(&self, method: &str, status: &str, duration_secs: f64) {
        self.request_duration_seconds
            .with_label_values(&[method, status])
            .observe(duration_secs);
    }

    pub fn inc_http_request(&self, method: &str, status: &str) {
        self.requests_total.with_label_values(&[method, status]).inc();
    }

    pub fn observe_db_query(&self, operation: &str, duration_secs: f64) {
        self.db_query_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!("Failed to encode metrics: {}", e);
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
