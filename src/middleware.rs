use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
    Extension,
};

use crate::{
    error::{ErrorMessage, HttpError},
    AppState,
};

pub const API_KEY_HEADER: &str = "x-api-key";

fn presented_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(str::to_owned)
        })
}

/// Guards admin and scheduler routes with the shared `ADMIN_API_KEY`.
/// When no key is configured the routes are open.
pub async fn require_api_key(
    Extension(app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(expected) = &app_state.env.admin_api_key {
        let provided = presented_key(req.headers())
            .ok_or_else(|| HttpError::unauthorized(ErrorMessage::ApiKeyNotProvided.to_string()))?;

        if provided != *expected {
            tracing::warn!("Rejected {} {}: invalid API key", req.method(), req.uri().path());
            return Err(HttpError::unauthorized(ErrorMessage::InvalidApiKey.to_string()));
        }
    }

    Ok(next.run(req).await)
}
