//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Lookup
///
/// Local LRU first, then the remote cache, then the database. Unknown codes
/// are cached as tombstones so repeated misses stay off the database.
///
/// # Errors
///
/// - 404 if the code does not exist
/// - 410 if the link has expired
/// - 500 if the stored URL cannot be sent as a `Location` header
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.url_service.get_long_url(&code).await?;

    let location = HeaderValue::from_str(&long_url).map_err(|e| {
        tracing::error!("Stored URL for {} is not a valid Location header: {}", code, e);
        AppError::internal("Internal server error", json!({}))
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
