use axum::http::HeaderMap;
use uuid::Uuid;

const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Per-request state threaded through the mapping/translation pipeline.
/// No shared mutable state crosses requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
}

/// Reads `X-Correlation-ID` from the inbound request, generating a fresh one
/// when absent.
pub fn extract_context(headers: &HeaderMap) -> RequestContext {
    let correlation_id = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    RequestContext { correlation_id }
}
