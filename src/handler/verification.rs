// handler/verification.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::verificationdtos::{PropertyVerificationDto, ReviewDecision, ReviewVerificationDto},
    error::HttpError,
    middleware::require_api_key,
    AppState,
};

pub fn verification_handler() -> Router {
    let admin_routes = Router::new()
        .route("/verifications/pending", get(get_pending_verifications))
        .route("/verifications/:verification_id/review", put(review_verification))
        .layer(middleware::from_fn(require_api_key));

    Router::new()
        .route("/verification/fee", get(get_verification_fee))
        .route(
            "/properties/:property_id/verification",
            get(get_verification_status).post(request_verification),
        )
        .route(
            "/properties/:property_id/verification/payment",
            post(confirm_verification_payment),
        )
        .nest("/admin", admin_routes)
}

pub async fn get_verification_fee(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": app_state.verification_service.fee()
    })))
}

pub async fn request_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (property, fee) = app_state
        .verification_service
        .request_verification(property_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Verification requested. Pay the verification fee to continue",
        "data": {
            "property": PropertyVerificationDto::from_property(&property),
            "fee": fee
        }
    })))
}

pub async fn confirm_verification_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let verification = app_state
        .verification_service
        .confirm_payment(property_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Payment received. Your property is awaiting admin review",
        "data": verification
    })))
}

pub async fn get_verification_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let status = app_state.verification_service.status(property_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": status
    })))
}

// Admin Handlers
pub async fn get_pending_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let pending = app_state.verification_service.pending().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": pending.len(),
        "data": pending
    })))
}

pub async fn review_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(verification_id): Path<Uuid>,
    Json(body): Json<ReviewVerificationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = app_state
        .verification_service
        .review(
            verification_id,
            body.admin_id,
            body.decision,
            body.review_notes,
            Utc::now(),
        )
        .await?;

    let message = match body.decision {
        ReviewDecision::Approve => "Verification approved",
        ReviewDecision::Reject => "Verification rejected",
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": message,
        "data": PropertyVerificationDto::from_property(&property)
    })))
}
