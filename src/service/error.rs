use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::propertymodel::VerificationStatus,
    service::lifecycle::VerificationAction,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Property {0} not found")]
    PropertyNotFound(Uuid),

    #[error("Verification request {0} not found")]
    VerificationNotFound(Uuid),

    #[error("Cannot {action} a property whose verification status is {from}")]
    InvalidTransition {
        from: VerificationStatus,
        action: VerificationAction,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        match error {
            ServiceError::PropertyNotFound(_) => {
                HttpError::new(ErrorMessage::PropertyNoLongerExist.to_string(), status)
            }
            ServiceError::VerificationNotFound(_) => {
                HttpError::new(ErrorMessage::VerificationNoLongerExist.to_string(), status)
            }
            ServiceError::InvalidTransition { .. } | ServiceError::Validation(_) => {
                HttpError::new(error.to_string(), status)
            }
            _ => {
                tracing::error!("Unhandled service error: {}", error);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::PropertyNotFound(_) | ServiceError::VerificationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Database(_) | ServiceError::Store(_) | ServiceError::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
