//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgUrlRepository`] - Short URL storage and live-row lookup

pub mod pg_url_repository;

pub use pg_url_repository::PgUrlRepository;
