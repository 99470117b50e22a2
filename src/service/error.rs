use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    // Collapses not-found and invalid-state so the caller cannot tell a
    // foreign record from an already-processed one.
    #[error("Payment request not found or already processed")]
    RequestNotFoundOrProcessed,

    #[error("Payment not found or already processed")]
    PaymentNotFoundOrProcessed,

    #[error("User {0} is not authorized to perform this action on {1}")]
    Unauthorized(Uuid, Uuid),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Payment signature verification failed")]
    SignatureMismatch,

    #[error("Settlement source for request {0} is not approved")]
    SettlementNotApproved(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("File storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::RequestNotFoundOrProcessed => {
                HttpError::not_found(ErrorMessage::RequestNotFoundOrProcessed.to_string())
            }

            ServiceError::PaymentNotFoundOrProcessed => {
                HttpError::not_found(ErrorMessage::PaymentNotFoundOrProcessed.to_string())
            }

            ServiceError::Unauthorized(_, _) => {
                HttpError::unauthorized(ErrorMessage::PermissionDenied.to_string())
            }

            ServiceError::InvalidAmount(_)
            | ServiceError::Validation(_)
            | ServiceError::SignatureMismatch
            | ServiceError::SettlementNotApproved(_) => HttpError::bad_request(error.to_string()),

            ServiceError::Gateway(_) => HttpError::payment_required(error.to_string()),

            _ => HttpError::server_error(error.to_string()),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::RequestNotFoundOrProcessed
            | ServiceError::PaymentNotFoundOrProcessed => StatusCode::NOT_FOUND,

            ServiceError::Unauthorized(_, _) => StatusCode::UNAUTHORIZED,

            ServiceError::InvalidAmount(_)
            | ServiceError::Validation(_)
            | ServiceError::SignatureMismatch
            | ServiceError::SettlementNotApproved(_) => StatusCode::BAD_REQUEST,

            ServiceError::Gateway(_) => StatusCode::PAYMENT_REQUIRED,

            ServiceError::Database(_)
            | ServiceError::Io(_)
            | ServiceError::Serialization(_)
            | ServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
