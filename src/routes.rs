// routes.rs
use std::{any::Any, sync::Arc};

use axum::{middleware, response::Response, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    handler::{
        maintenance::{internal_error_response, maintenance_handler},
        verification::verification_handler,
    },
    middleware::require_api_key,
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Request handler panicked: {}", details);

    internal_error_response()
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let maintenance_routes =
        maintenance_handler().layer(middleware::from_fn(require_api_key));

    Router::new()
        .route("/health", get(health_check))
        .merge(maintenance_routes)
        .nest("/api", verification_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
        .layer(CatchPanicLayer::custom(handle_panic))
}
