//! Application layer services implementing business logic.
//!
//! This layer orchestrates the store, the cache layers and the code
//! generator behind a single service consumed by HTTP handlers and the
//! admin CLI.
//!
//! # Available Services
//!
//! - [`services::url_service::UrlService`] - Shortening, layered lookup and deletion

pub mod services;
