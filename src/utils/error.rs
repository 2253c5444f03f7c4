use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The seat is booked or actively held by someone else.
    #[error("Seat unavailable: {0}")]
    SeatConflict(String),

    /// The swap transaction was rolled back.
    #[error("Seat swap failed: {0}")]
    SwapFailed(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(detail) => AppError::SeatConflict(detail),
            StoreError::NotFound => AppError::NotFound("record no longer exists".to_string()),
            StoreError::Database(e) => AppError::DatabaseError(e),
            StoreError::Backend(msg) => AppError::PersistenceError(msg),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SeatConflict(_) => StatusCode::CONFLICT,
            AppError::SwapFailed(_)
            | AppError::PersistenceError(_)
            | AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SeatConflict(_) => "SEAT_CONFLICT",
            AppError::SwapFailed(_) => "SWAP_FAILED",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::SeatConflict(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::SwapFailed(msg) | AppError::PersistenceError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Store failures stay in the logs; clients get a generic message.
        let public_message = match &self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::SeatConflict(_) => {
                "Seat unavailable, please choose another seat".to_string()
            }
            AppError::SwapFailed(_) => "The seat change could not be completed".to_string(),
            AppError::PersistenceError(_) | AppError::DatabaseError(_) => {
                "A database error occurred".to_string()
            }
        };

        error_response(code, public_message, None, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err: AppError = StoreError::UniqueViolation("tickets_live_seat_unique".into()).into();
        assert!(matches!(err, AppError::SeatConflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "SEAT_CONFLICT");
    }

    #[test]
    fn test_backend_failure_is_a_persistence_error() {
        let err: AppError = StoreError::Backend("connection refused".into()).into();
        assert_eq!(err.code(), "PERSISTENCE_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_status() {
        let response = AppError::NotFound("ticket".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_swap_and_store_failures_are_server_errors() {
        for err in [
            AppError::SwapFailed("rolled back".into()),
            AppError::PersistenceError("connection reset".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(AppError::SwapFailed("rolled back".into()).code(), "SWAP_FAILED");
    }
}
