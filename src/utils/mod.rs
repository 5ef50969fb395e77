//! Helpers shared across layers.
//!
//! - [`validation`] - long URL and custom code rules
//! - [`db_error`] - duplicate-key detection for SQLx errors

pub mod db_error;
pub mod validation;
