use std::sync::Arc;

use axum::{Router, routing::post};

use crate::{
    config::Config,
    provider::OpenAIClient,
    telemetry::{LogSink, Sink},
};

use super::handler;

/// Shared, immutable state constructed once at startup and cloned (via
/// `Arc`) into every request.
pub struct GatewayState {
    pub openai: OpenAIClient,
    pub config: Config,
    pub sink: Arc<dyn Sink>,
}

impl GatewayState {
    pub fn new(config: Config) -> Self {
        let openai = OpenAIClient::new(config.openai_base_url.clone(), config.openai_api_key.clone());

        Self {
            openai,
            config,
            sink: Arc::new(LogSink),
        }
    }
}

/// Builds the axum router exposing the Messages-API-shaped surface.
pub fn build_router(config: Config) -> Router {
    let state = Arc::new(GatewayState::new(config));

    Router::new()
        .route("/v1/messages", post(handler::messages))
        .route("/v1/messages/stream", post(handler::messages_stream))
        .route("/v1/messages/count_tokens", post(handler::count_tokens))
        .route("/v1/messages/token_count", post(handler::count_tokens))
        .with_state(state)
}
