//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::loan::LoanStatus;

/// Application error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    DbFailure = 3,
    NoSuchLoan = 5,
    ItemNotAvailable = 7,
    BadValue = 18,
    InvalidReference = 22,
    InvalidTransition = 23,
    Duplicate = 24,
}

/// Failures of the loan lifecycle core.
///
/// Every variant is produced before the surrounding transaction commits,
/// so none of them leaves a book counter changed without its loan.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("No available copies of book {book_id}")]
    InsufficientCopies { book_id: i32 },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: LoanStatus, to: LoanStatus },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result type alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Item not available: {0}")]
    NotAvailable(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Already exists: {0}")]
    Duplicate(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            e @ LifecycleError::InsufficientCopies { .. } => AppError::NotAvailable(e.to_string()),
            LifecycleError::InvalidReference(msg) => AppError::InvalidReference(msg),
            e @ LifecycleError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
            LifecycleError::NotFound(msg) => AppError::NotFound(msg),
            LifecycleError::Validation(msg) => AppError::Validation(msg),
            LifecycleError::Duplicate(msg) => AppError::Duplicate(msg),
            LifecycleError::Storage(e) => AppError::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::InvalidTransition, msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::NotAvailable(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ItemNotAvailable, msg.clone())
            }
            AppError::InvalidReference(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidReference, msg.clone())
            }
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: LifecycleError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn lifecycle_errors_map_to_http_status() {
        assert_eq!(
            status_of(LifecycleError::InsufficientCopies { book_id: 1 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LifecycleError::InvalidReference("book 9".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LifecycleError::InvalidTransition {
                from: LoanStatus::Returned,
                to: LoanStatus::Borrowed,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LifecycleError::NotFound("loan 3".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LifecycleError::Validation("dates".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LifecycleError::Duplicate("isbn 978".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LifecycleError::Storage(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_failure_message_is_not_leaked() {
        let (_, code, message) = AppError::from(LifecycleError::Storage(sqlx::Error::PoolClosed)).parts();
        assert_eq!(code, ErrorCode::DbFailure);
        assert_eq!(message, "Database error");
    }

    #[test]
    fn insufficient_copies_message_names_the_book() {
        assert_eq!(
            LifecycleError::InsufficientCopies { book_id: 42 }.to_string(),
            "No available copies of book 42"
        );
    }
}
