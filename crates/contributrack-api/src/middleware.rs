use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject the request unless `x-api-key` matches the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if !bool::from(provided.ct_eq(state.api_key.as_bytes())) {
        warn!(path = %req.uri().path(), "Rejected request with missing or invalid API key");
        return Err(ApiError::InvalidApiKey);
    }

    Ok(next.run(req).await)
}
