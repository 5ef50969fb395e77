//! Business logic services for the application layer.

pub mod url_service;

pub use url_service::{
    HealthReport, MAX_ATTEMPTS, NewShortUrl, ShortenedUrl, UrlService, UrlServiceError,
    UrlServiceSettings,
};
