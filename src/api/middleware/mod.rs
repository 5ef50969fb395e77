//! HTTP middleware for request processing.
//!
//! Provides request tracing and request metrics.

pub mod metrics;
pub mod tracing;
