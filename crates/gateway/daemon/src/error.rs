//! Error types for gateway-daemon

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_types::GatewayError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
///
/// Messages are surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request parameters
    #[error("{0}")]
    BadRequest(String),

    /// Missing organization, or a user with no enrolled identity
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// The operation ran and reported failure
    #[error("{0}")]
    OperationFailed(String),

    /// Internal error
    #[error("{0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::OperationFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "OPERATION_FAILED")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(message) => ApiError::BadRequest(message),
            e @ GatewayError::IdentityNotFound { .. } => ApiError::Unauthorized(e.to_string()),
            e @ GatewayError::ChannelNotFound(_) => ApiError::NotFound(e.to_string()),
            GatewayError::Internal(message) => ApiError::Internal(message),
            other => ApiError::OperationFailed(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::{ChannelId, OrgName};

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("Missing peers".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("missing org".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::OperationFailed("Failed to install".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gateway_error_mapping() {
        assert!(matches!(
            ApiError::from(GatewayError::missing("fcn")),
            ApiError::BadRequest(ref m) if m == "Missing fcn"
        ));
        assert!(matches!(
            ApiError::from(GatewayError::IdentityNotFound {
                org: OrgName::new("org1"),
                user: "mallory".to_string(),
            }),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(GatewayError::ChannelNotFound(ChannelId::new("x"))),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(GatewayError::Query("boom".to_string())),
            ApiError::OperationFailed(_)
        ));
    }
}
