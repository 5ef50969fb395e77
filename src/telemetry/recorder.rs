//! MetricsRecorder trait for dependency injection.

use std::sync::Arc;

/// Trait for recording service metrics.
///
/// All methods are no-op by default, allowing partial implementation.
/// Implementations must be thread-safe (Send + Sync).
#[allow(unused_variables)]
pub trait MetricsRecorder: Send + Sync {
    // ===== Cache =====

    /// Record a cache hit on `layer`
    fn inc_cache_hit(&self, layer: &str) {}

    /// Record a cache miss on `layer`
    fn inc_cache_miss(&self, layer: &str) {}

    /// Set the current entry count of `layer`
    fn set_cache_entries(&self, layer: &str, count: f64) {}

    // ===== HTTP =====

    /// Observe HTTP request duration
    fn observe_http_request(&self, method: &str, status: &str, duration_secs: f64) {}

    /// Record HTTP request
    fn inc_http_request(&self, method: &str, status: &str) {}

    // ===== Database =====

    /// Observe database query duration
    fn observe_db_query(&self, operation: &str, duration_secs: f64) {}

    /// Renders all metrics in the Prometheus text format.
    fn render(&self) -> String {
        String::new()
    }
}

/// Noop metrics implementation for tests and tools.
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {}

impl NoopMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn MetricsRecorder> {
        Arc::new(Self::new())
    }
}

impl Default for NoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Delegates to the global [`super::METRICS`] registry.
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    pub fn arc() -> Arc<dyn MetricsRecorder> {
        Arc::new(Self)
    }
}

impl MetricsRecorder for PrometheusMetrics {
    fn inc_cache_hit(&self, layer: &str) {
        super::METRICS.inc_cache_hit(layer);
    }

    fn inc_cache_miss(&self, layer: &str) {
        super::METRICS.inc_cache_miss(layer);
    }

    fn set_cache_entries(&self, layer: &str, count: f64) {
        super::METRICS.set_cache_entries(layer, count);
    }

    fn observe_http_request(&self, method: &str, status: &str, duration_secs: f64) {
        super::METRICS.observe_http_request(method, status, duration_secs);
    }

    fn inc_http_request(&self, method: &str, status: &str) {
        super::METRICS.inc_http_request(method, status);
    }

    fn observe_db_query(&self, operation: &str, duration_secs: f64) {
        super::METRICS.observe_db_query(operation, duration_secs);
    }

    fn render(&self) -> String {
        super::METRICS.export()
    }
}
