use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::{GatewayError, Result},
    http_client::http_client,
    protocol::openai::{ResponseEvent, ResponsesRequest, ResponsesResponse},
    request::RequestContext,
};

pub type ResponseEventStream = Pin<Box<dyn Stream<Item = ResponseEvent> + Send>>;

/// Thin HTTP client over the upstream Responses API. Holds one shared
/// `reqwest::Client`; no per-request state.
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl OpenAIClient {
    pub fn new(base_url: String, api_key: Option<SecretString>) -> Self {
        Self {
            client: http_client(),
            base_url,
            api_key,
        }
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or(GatewayError::AuthenticationFailed)
    }

    pub async fn send(&self, request: &ResponsesRequest, context: &RequestContext) -> Result<ResponsesResponse> {
        let key = self.api_key()?;
        let url = format!("{}/responses", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", key.expose_secret()))
            .header("X-Correlation-ID", context.correlation_id.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| GatewayError::Upstream {
                status: None,
                message: format!("failed to reach upstream: {err}"),
                body: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(status, response.text().await.ok()));
        }

        response.json().await.map_err(|err| GatewayError::Upstream {
            status: None,
            message: format!("failed to parse upstream response: {err}"),
            body: None,
        })
    }

    pub async fn stream(&self, request: &ResponsesRequest, context: &RequestContext) -> Result<ResponseEventStream> {
        let key = self.api_key()?;
        let url = format!("{}/responses", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", key.expose_secret()))
            .header("X-Correlation-ID", context.correlation_id.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| GatewayError::Upstream {
                status: None,
                message: format!("failed to reach upstream: {err}"),
                body: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(status, response.text().await.ok()));
        }

        let events = response.bytes_stream().eventsource().filter_map(|event| async move {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    log::warn!("SSE parsing error in upstream stream: {err}");
                    return None;
                }
            };

            match serde_json::from_str::<ResponseEvent>(&event.data) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    log::warn!("failed to parse upstream event: {err}");
                    None
                }
            }
        });

        Ok(Box::pin(events))
    }
}

fn map_error_status(status: StatusCode, body_text: Option<String>) -> GatewayError {
    let message = body_text.clone().unwrap_or_else(|| status.to_string());
    let body = body_text.and_then(|text| serde_json::from_str(&text).ok());

    GatewayError::from_upstream_status(status, message, body)
}
