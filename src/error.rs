use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Bad or missing caller input. Never escalates past a 400.
    #[error("{0}")]
    Validation(String),

    /// A required upstream call failed and there is no fallback.
    #[error("Dependency failure: {0}")]
    Dependency(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered but reported a business failure.
    #[error("Upstream rejected request (code {code}): {message}")]
    UpstreamRejected { code: i64, message: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl CheckoutError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency(_) | Self::Http(_))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let (status, error_code) = match &self {
            CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            CheckoutError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            CheckoutError::Dependency(_) | CheckoutError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "DEPENDENCY_ERROR")
            }
            CheckoutError::UpstreamRejected { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_REJECTED"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Upstream detail stays in the log; the caller gets a generic message.
        let message = match &self {
            CheckoutError::Dependency(_) | CheckoutError::Http(_) => {
                "Upstream service unavailable".to_string()
            }
            CheckoutError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id: request_id.clone(),
        };

        if status.is_client_error() {
            tracing::info!(error = %self, error_code, request_id, "Request rejected");
        } else {
            tracing::error!(error = ?self, error_code, request_id, "Request failed");
        }

        (status, Json(body)).into_response()
    }
}
