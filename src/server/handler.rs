use std::{collections::VecDeque, convert::Infallible, sync::Arc};

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response, Sse, sse::Event},
};
use futures::{Stream, StreamExt};
use serde_json::json;

use crate::{
    error::Result,
    mapping::{StreamState, map_request, map_response},
    model_resolver::resolve_model,
    protocol::anthropic::messages::{MessagesRequest, MessagesResponse, StreamEvent},
    request::extract_context,
    telemetry::LogFields,
    token_counter::count_input_tokens,
};

use super::builder::GatewayState;

fn resolved_model(state: &GatewayState, request: &MessagesRequest) -> String {
    resolve_model(&request.model, &state.config.model_map, state.config.openai_default_model.as_deref())
}

/// `POST /v1/messages`: streams when the body sets `stream: true`, otherwise
/// responds with a single JSON envelope.
pub async fn messages(State(state): State<Arc<GatewayState>>, headers: HeaderMap, Json(request): Json<MessagesRequest>) -> Result<Response> {
    if request.stream {
        stream_response(state, headers, request).await
    } else {
        json_response(state, headers, request).await.map(IntoResponse::into_response)
    }
}

/// `POST /v1/messages/stream`: always streams, regardless of the body's
/// `stream` field.
pub async fn messages_stream(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(mut request): Json<MessagesRequest>,
) -> Result<Response> {
    request.stream = true;
    stream_response(state, headers, request).await
}

/// `POST /v1/messages/count_tokens` and its `/token_count` alias: no
/// upstream call.
pub async fn count_tokens(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<MessagesRequest>,
) -> Result<Json<serde_json::Value>> {
    let resolved = resolved_model(&state, &request);
    let mapped = map_request(&request, resolved)?;
    let input_tokens = count_input_tokens(&mapped);

    Ok(Json(json!({ "input_tokens": input_tokens })))
}

async fn json_response(state: Arc<GatewayState>, headers: HeaderMap, request: MessagesRequest) -> Result<Json<MessagesResponse>> {
    let context = extract_context(&headers);
    let resolved = resolved_model(&state, &request);
    let inbound_model = request.model.clone();
    let mapped = map_request(&request, resolved)?;

    let upstream_response = state.openai.send(&mapped, &context).await?;
    let (content, stop_reason, usage) = map_response(&upstream_response);

    let response = MessagesResponse::new(upstream_response.id, inbound_model, content, Some(stop_reason), usage);

    state.sink.log(
        "messages.completed",
        LogFields {
            correlation_id: &context.correlation_id,
            usage: Some(response.usage),
            ..Default::default()
        },
    );

    Ok(Json(response))
}

async fn stream_response(state: Arc<GatewayState>, headers: HeaderMap, request: MessagesRequest) -> Result<Response> {
    let context = extract_context(&headers);
    let resolved = resolved_model(&state, &request);
    let inbound_model = request.model.clone();
    let mapped = map_request(&request, resolved)?;

    // Credential/connect failures happen before any downstream frame is
    // written, so they surface as an HTTP error response rather than a
    // mid-stream `error` frame.
    let upstream = state.openai.stream(&mapped, &context).await?;

    let input_tokens = count_input_tokens(&mapped);
    let machine = StreamState::new(inbound_model, input_tokens);

    let sse_stream = translate(upstream, machine).map(Ok::<_, Infallible>);

    Ok(Sse::new(sse_stream).into_response())
}

/// Drives the upstream event stream through the `StreamState` machine,
/// draining the (possibly multi-frame) output of each `apply` call before
/// pulling the next upstream event.
fn translate(
    upstream: crate::provider::openai::ResponseEventStream,
    machine: StreamState,
) -> impl Stream<Item = Event> {
    futures::stream::unfold((upstream, machine, VecDeque::new()), |(mut upstream, mut machine, mut pending)| async move {
        loop {
            if let Some(frame) = pending.pop_front() {
                return Some((to_sse_event(&frame), (upstream, machine, pending)));
            }

            if machine.is_terminal() {
                return None;
            }

            match upstream.next().await {
                Some(event) => {
                    pending.extend(machine.apply(event));
                }
                None => {
                    pending.extend(machine.finalize_on_early_end());
                    if pending.is_empty() {
                        return None;
                    }
                }
            }
        }
    })
}

fn to_sse_event(frame: &StreamEvent) -> Event {
    let data = serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(frame.event_name()).data(data)
}
