//! API error types and JSON error response formatting.
//!
//! Analysis failures are mapped onto HTTP status codes here so handlers can
//! simply use `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use lumen_nlq::AnalysisError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Statement text when the failure happened at or after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - the question failed validation.
    BadRequest(String),
    /// 404 Not Found - unknown session, or a query that matched nothing.
    NotFound { message: String, sql: Option<String> },
    /// 422 Unprocessable Entity - understood, but not answerable as asked.
    UnprocessableEntity(String),
    /// 500 Internal Server Error.
    Internal { message: String, sql: Option<String> },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            sql: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message, sql) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::NotFound { message, sql } => ("not_found", message, sql),
            ApiError::UnprocessableEntity(msg) => ("unprocessable_entity", msg, None),
            ApiError::Internal { message, sql } => ("internal_error", message, sql),
        };

        if status.is_server_error() {
            tracing::error!(%message, "Request failed");
        }

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            sql,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let message = err.to_string();
        if err.is_validation() {
            return ApiError::BadRequest(message);
        }
        let sql = err.sql().map(str::to_string);
        match err {
            AnalysisError::UnderspecifiedComparison { .. } => {
                ApiError::UnprocessableEntity(message)
            }
            AnalysisError::NoData { .. } => ApiError::NotFound { message, sql },
            _ => ApiError::Internal { message, sql },
        }
    }
}
