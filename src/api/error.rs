//! API Error Types
//!
//! Maps timeline and ledger failures onto HTTP status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::reconcile::ReconcileError;
use crate::timeline::TimelineError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Timeline action or fetch failed
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// Request body could not be read as the expected JSON
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Timeline(e) => match e {
                TimelineError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                TimelineError::NotInitialized => (StatusCode::CONFLICT, "TIMELINE_NOT_INITIALIZED"),
                TimelineError::PackageNotConfigured => {
                    (StatusCode::SERVICE_UNAVAILABLE, "PACKAGE_NOT_CONFIGURED")
                }
                TimelineError::Reconcile(ReconcileError::TimelineNotFound { .. }) => {
                    (StatusCode::NOT_FOUND, "TIMELINE_NOT_FOUND")
                }
                TimelineError::Reconcile(ReconcileError::TableUnresolvable { .. }) => {
                    (StatusCode::BAD_GATEWAY, "TABLE_UNRESOLVABLE")
                }
                TimelineError::Reconcile(ReconcileError::FetchFailed(_))
                | TimelineError::Ledger(_)
                | TimelineError::NoTimelineCreated { .. } => (StatusCode::BAD_GATEWAY, "LEDGER_ERROR"),
                TimelineError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use crate::post::ValidationError;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(TimelineError::Validation(ValidationError::TooLong));
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Post content must be 500 characters or less");

        let err = ApiError::from(TimelineError::Reconcile(ReconcileError::TimelineNotFound {
            timeline_id: "0x1".to_string(),
        }));
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);

        let err = ApiError::from(TimelineError::Ledger(LedgerError::Timeout));
        assert_eq!(err.status_and_code(), (StatusCode::BAD_GATEWAY, "LEDGER_ERROR"));
    }
}
