//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and codegen layers,
//! providing concrete implementations for persistence, caching and counters.
//!
//! # Modules
//!
//! - [`cache`] - Local LRU plus Redis and no-op remote caches
//! - [`counter`] - Redis `INCR` counter for the sequential allocator
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod counter;
pub mod persistence;
