//! DTOs for the shortening endpoint.

use serde::{Deserialize, Serialize};

use crate::application::services::{NewShortUrl, ShortenedUrl};

/// Request to shorten a URL.
///
/// Unknown fields are rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShortenRequest {
    /// The original URL (absolute http or https).
    pub url: String,

    /// Optional custom short code.
    #[serde(default)]
    pub custom_code: Option<String>,
}

impl From<ShortenRequest> for NewShortUrl {
    fn from(req: ShortenRequest) -> Self {
        Self {
            long_url: req.url,
            custom_code: req.custom_code,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
}

impl From<ShortenedUrl> for ShortenResponse {
    fn from(s: ShortenedUrl) -> Self {
        Self {
            short_code: s.short_code,
            short_url: s.short_url,
            long_url: s.long_url,
        }
    }
}
