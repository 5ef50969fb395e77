//! Service telemetry.
//!
//! Components record through [`MetricsRecorder`]; production wires in
//! [`PrometheusMetrics`], which forwards to the process-wide [`METRICS`]
//! registry, and tests use [`NoopMetrics`] or their own recorder.

mod recorder;
mod registry;

pub use recorder::{MetricsRecorder, NoopMetrics, PrometheusMetrics};
pub use registry::{METRICS, Metrics};

/// Cache layer label for the in-process LRU.
pub const LAYER_L1: &str = "l1";

/// Cache layer label for the remote cache.
pub const LAYER_L2: &str = "l2";
