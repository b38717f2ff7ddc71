//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;

/// Result type alias for handlers
pub type ApiResult<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// The `Display` text of each variant is the message returned to the client;
/// details are logged, not exposed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read the uploaded file")]
    InvalidUpload(String),

    #[error("Invalid date parameters")]
    InvalidDate(String),

    #[error("Failed to connect to the database")]
    DatabaseUnavailable(#[source] cashback_ingest::IngestError),

    #[error("Server configuration error")]
    Config(#[source] cashback_ingest::IngestError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUpload(_) | AppError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseUnavailable(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidUpload(_) => "INVALID_UPLOAD",
            AppError::InvalidDate(_) => "INVALID_DATE",
            AppError::DatabaseUnavailable(_) => "DATABASE_UNAVAILABLE",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InvalidUpload(detail) => {
                tracing::warn!(detail = %detail, "Rejected upload");
            },
            AppError::InvalidDate(detail) => {
                tracing::warn!(detail = %detail, "Rejected date parameters");
            },
            AppError::DatabaseUnavailable(e) => {
                tracing::error!(error = %e, "Database connection failed");
            },
            AppError::Config(e) => {
                tracing::error!(error = %e, "Invalid server configuration");
            },
        }

        let status = self.status();
        let body = ErrorResponse::new(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        assert_eq!(
            AppError::InvalidUpload("no field".into()).to_string(),
            "Failed to read the uploaded file"
        );
        assert_eq!(
            AppError::InvalidDate("month missing".into()).to_string(),
            "Invalid date parameters"
        );
        assert_eq!(
            AppError::DatabaseUnavailable(cashback_ingest::IngestError::Config("x".into()))
                .to_string(),
            "Failed to connect to the database"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidUpload(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidDate(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DatabaseUnavailable(cashback_ingest::IngestError::Config(String::new()))
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Config(cashback_ingest::IngestError::Config(String::new())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
