//! Core domain entities.
//!
//! Entities follow the "New Type" pattern with a separate struct for creation:
//! [`NewUrlRecord`] carries what the caller knows, [`UrlRecord`] adds the
//! identity assigned by the store.

pub mod url_record;

pub use url_record::{NewUrlRecord, UrlRecord};
