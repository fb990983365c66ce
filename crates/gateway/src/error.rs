//! Uniform JSON error responses for proxy routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use proto::{ConfigError, UpstreamError, ValidationError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error returned by a proxy route
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request; 400.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Upstream non-2xx; upstream status with `details`.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Missing server-side credential; 500.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upstream rejected a request whose payload is not forwarded.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Transport or internal failure; 500 with a generic message.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

fn status_or_bad_gateway(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

impl ApiError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(e) => status_or_bad_gateway(e.status),
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Status { status, .. } => status_or_bad_gateway(*status),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Upstream(e) => ErrorBody {
                error: e.message,
                details: Some(e.payload),
            },
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
