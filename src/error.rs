use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::protocol::anthropic::error::{Error as AnthropicError, ErrorResponse};

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Every failure in the gateway surfaces as an Anthropic-style error
/// envelope; this enum carries enough information to pick both the HTTP
/// status and the envelope's `error.type`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("missing or invalid API credential")]
    AuthenticationFailed,

    #[error("upstream rejected the request: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Any other upstream 4xx/5xx, or a transport failure.
    #[error("upstream error: {message}")]
    Upstream {
        status: Option<StatusCode>,
        message: String,
        body: Option<serde_json::Value>,
    },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream { status, .. } => status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Builds the Anthropic-shaped error envelope for this failure.
    pub fn to_envelope(&self) -> ErrorResponse {
        let error = match self {
            Self::InvalidRequest(message) => AnthropicError::invalid_request_error(message.clone()),
            Self::AuthenticationFailed => AnthropicError::authentication_error(self.to_string()),
            Self::PermissionDenied(message) => AnthropicError::permission_error(message.clone()),
            Self::NotFound(message) => AnthropicError::not_found_error(message.clone()),
            Self::RateLimited(message) => AnthropicError::rate_limit_error(message.clone()),
            Self::Upstream { message, body, .. } => {
                let error = AnthropicError::api_error(message.clone());
                match body {
                    Some(body) => error.with_upstream_body(body.clone()),
                    None => error,
                }
            }
        };

        ErrorResponse::new(error)
    }

    /// Maps an upstream HTTP status code to the corresponding gateway error,
    /// per the kind/trigger/HTTP table.
    pub fn from_upstream_status(status: StatusCode, message: String, body: Option<serde_json::Value>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::AuthenticationFailed,
            StatusCode::FORBIDDEN => Self::PermissionDenied(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(message),
            _ => Self::Upstream {
                status: Some(status),
                message,
                body,
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let envelope = self.to_envelope();

        (status, Json(envelope)).into_response()
    }
}
