// handler/maintenance.rs
use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::AppState;

/// Scheduler-facing triggers. Handled job failures still answer 200 with
/// `success: false`; the caller decides whether to alert or retry.
pub fn maintenance_handler() -> Router {
    Router::new()
        .route("/expire-verifications", post(expire_verifications))
        .route("/send-expiry-reminders", post(send_expiry_reminders))
        .route("/run-maintenance", post(run_maintenance))
}

pub async fn expire_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = app_state
        .maintenance_service
        .expire_verifications(Utc::now())
        .await;

    Json(result)
}

pub async fn send_expiry_reminders(
    Extension(app_state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = app_state
        .maintenance_service
        .send_expiry_reminders(Utc::now())
        .await;

    Json(result)
}

pub async fn run_maintenance(Extension(app_state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let report = app_state.maintenance_service.run_maintenance(Utc::now()).await;

    if !report.is_success() {
        tracing::warn!(
            "Maintenance finished with failures (expiry ok: {}, reminders ok: {})",
            report.expiry.success,
            report.reminders.success
        );
    }

    Json(report)
}

/// Response for anything that escapes the jobs (panics included).
pub fn internal_error_response() -> Response {
    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Internal server error"
        })),
    )
        .into_response()
}
