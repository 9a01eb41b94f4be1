use serde::{Deserialize, Serialize};

use crate::protocol::unknown_fields::UnknownFields;

pub const ERROR_TYPE_INVALID_REQUEST: &str = "invalid_request_error";
pub const ERROR_TYPE_AUTHENTICATION: &str = "authentication_error";
pub const ERROR_TYPE_PERMISSION: &str = "permission_error";
pub const ERROR_TYPE_NOT_FOUND: &str = "not_found_error";
pub const ERROR_TYPE_RATE_LIMIT: &str = "rate_limit_error";
pub const ERROR_TYPE_API: &str = "api_error";

/// Outbound-only: never deserialized, so the static `type` discriminant
/// doesn't need to round-trip.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub error: Error,
}

impl ErrorResponse {
    pub fn new(error: Error) -> Self {
        Self { r#type: "error", error }
    }
}

/// Anthropic error payload surfaced for non-2xx responses and `error` stream frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    #[serde(rename = "type")]
    pub r#type: String,

    pub message: String,

    /// Raw upstream error body, when the failure originated at the upstream call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<serde_json::Value>,

    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

impl Error {
    fn new(r#type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            message: message.into(),
            openai: None,
            unknown_fields: UnknownFields::default(),
        }
    }

    pub fn with_upstream_body(mut self, body: serde_json::Value) -> Self {
        self.openai = Some(body);
        self
    }

    pub fn invalid_request_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TYPE_INVALID_REQUEST, message)
    }

    pub fn authentication_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TYPE_AUTHENTICATION, message)
    }

    pub fn permission_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TYPE_PERMISSION, message)
    }

    pub fn not_found_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TYPE_NOT_FOUND, message)
    }

    pub fn rate_limit_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TYPE_RATE_LIMIT, message)
    }

    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TYPE_API, message)
    }
}
