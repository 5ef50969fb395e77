//! Handler for short URL deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::AppError;
use crate::state::AppState;

/// Deletes a short code.
///
/// # Endpoint
///
/// `DELETE /{code}`
///
/// Both cache layers are invalidated whether or not the code existed.
///
/// # Errors
///
/// - 404 if the code does not exist
pub async fn delete_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.url_service.delete(&code).await?;

    Ok(StatusCode::NO_CONTENT)
}
