//! Standard error envelope for HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::types::ErrorEnvelope;

/// Handler-facing error
///
/// Every variant renders as `{"error": <message>, "status": <code>}` with
/// the matching HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 403
    #[error("{0}")]
    Forbidden(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 500
    #[error("{0}")]
    Internal(String),

    /// 502 - an upstream service (GitHub, the other NMRL service) failed
    #[error("{0}")]
    BadGateway(String),

    /// Status relayed from an upstream response
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    /// Error envelope body for this error
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
            status: Some(self.status().as_u16()),
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else {
            match err {
                crate::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
                other => ApiError::Internal(other.to_string()),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
