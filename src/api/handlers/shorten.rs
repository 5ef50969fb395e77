//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/a", "custom_code": "hello" }
/// ```
///
/// `custom_code` is optional; without it a code is generated.
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_code": "hello",
///   "short_url": "http://localhost:8080/hello",
///   "long_url": "https://example.com/a"
/// }
/// ```
///
/// # Errors
///
/// - 400 for malformed JSON, unknown fields, an invalid URL or custom code
/// - 409 if the custom code is taken
/// - 500 on store or generator failure
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    let Json(payload) = payload?;

    let created = state.url_service.shorten(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}
