//! End-to-end tests spinning up the gateway's router against a local mock
//! upstream axum server, mirroring the teacher's `AnthropicProvider`/
//! `OpenAIMock` test style (`TcpListener::bind("127.0.0.1:0")` +
//! `axum::serve`, spawned on a background task).

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Json, Router,
    response::{IntoResponse, Sse, sse::Event},
    routing::post,
};
use futures::stream;
use messages_gateway::config::{Config, ModelMap};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Spawns a mock `/responses` upstream. Branches on the mapped request's
/// `stream` field: `false` replies with a single completed envelope,
/// `true` replies with a canned SSE event sequence.
async fn spawn_mock_upstream() -> SocketAddr {
    let app = Router::new().route("/responses", post(handle_responses));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    address
}

async fn handle_responses(Json(body): Json<Value>) -> axum::response::Response {
    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    if !streaming {
        return Json(json!({
            "id": "resp_test",
            "status": "completed",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "pong"}]
            }],
            "usage": {"input_tokens": 2, "output_tokens": 1}
        }))
        .into_response();
    }

    let frames = vec![
        sse_frame("response.created", json!({"type": "response.created", "response": {"id": "resp_test", "output": []}})),
        sse_frame(
            "response.output_item.added",
            json!({
                "type": "response.output_item.added",
                "output_index": 0,
                "item": {"type": "message", "role": "assistant", "content": []}
            }),
        ),
        sse_frame(
            "response.content_part.added",
            json!({
                "type": "response.content_part.added",
                "output_index": 0,
                "content_index": 0,
                "part": {"type": "output_text", "text": ""}
            }),
        ),
        sse_frame(
            "response.output_text.delta",
            json!({
                "type": "response.output_text.delta",
                "output_index": 0,
                "content_index": 0,
                "delta": "Hel"
            }),
        ),
        sse_frame(
            "response.output_text.delta",
            json!({
                "type": "response.output_text.delta",
                "output_index": 0,
                "content_index": 0,
                "delta": "lo"
            }),
        ),
        sse_frame(
            "response.content_part.done",
            json!({
                "type": "response.content_part.done",
                "output_index": 0,
                "content_index": 0,
                "part": {"type": "output_text", "text": "Hello"}
            }),
        ),
        sse_frame(
            "response.output_item.done",
            json!({
                "type": "response.output_item.done",
                "output_index": 0,
                "item": {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Hello"}]}
            }),
        ),
        sse_frame(
            "response.completed",
            json!({
                "type": "response.completed",
                "response": {
                    "id": "resp_test",
                    "status": "completed",
                    "output": [{"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Hello"}]}],
                    "usage": {"input_tokens": 2, "output_tokens": 3}
                }
            }),
        ),
    ];

    Sse::new(stream::iter(frames.into_iter().map(Ok::<_, std::convert::Infallible>))).into_response()
}

fn sse_frame(name: &'static str, data: Value) -> Event {
    Event::default().event(name).data(data.to_string())
}

fn test_config(base_url: String, api_key: Option<&str>) -> Config {
    Config {
        openai_api_key: api_key.map(|key| SecretString::from(key.to_string())),
        openai_base_url: base_url,
        openai_default_model: Some("gpt-4o".to_string()),
        model_map: ModelMap::default(),
    }
}

async fn spawn_gateway(config: Config) -> SocketAddr {
    let router = messages_gateway::build_router(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    address
}

#[tokio::test]
async fn missing_credential_returns_an_authentication_error_envelope() {
    let upstream = spawn_mock_upstream().await;
    let config = test_config(format!("http://{upstream}"), None);
    let gateway = spawn_gateway(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{gateway}/v1/messages/stream"))
        .json(&json!({
            "model": "claude-3-5-sonnet",
            "messages": [{"role": "user", "content": "ping"}],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "authentication_error");
}

#[tokio::test]
async fn count_tokens_completes_with_the_upstream_unreachable() {
    // Port 0 never accepts a connection; any attempt to reach it proves the
    // handler made an upstream call it shouldn't have.
    let config = test_config("http://127.0.0.1:0".to_string(), Some("test-key"));
    let gateway = spawn_gateway(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{gateway}/v1/messages/count_tokens"))
        .json(&json!({
            "model": "claude-3-5-sonnet",
            "messages": [{"role": "user", "content": "ping"}],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["input_tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn non_streaming_completion_round_trips_through_the_mock_upstream() {
    let upstream = spawn_mock_upstream().await;
    let config = test_config(format!("http://{upstream}"), Some("test-key"));
    let gateway = spawn_gateway(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{gateway}/v1/messages"))
        .json(&json!({
            "model": "claude-3-5-sonnet",
            "messages": [{"role": "user", "content": "ping"}],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["model"], "claude-3-5-sonnet");
    assert_eq!(body["content"][0]["type"], "text");
    assert_eq!(body["content"][0]["text"], "pong");
    assert_eq!(body["stop_reason"], "end_turn");
    assert_eq!(body["usage"]["input_tokens"], 2);
    assert_eq!(body["usage"]["output_tokens"], 1);
}

#[tokio::test]
async fn streaming_completion_emits_literal_sse_framing_in_lifecycle_order() {
    let upstream = spawn_mock_upstream().await;
    let config = test_config(format!("http://{upstream}"), Some("test-key"));
    let gateway = spawn_gateway(config).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{gateway}/v1/messages/stream"))
        .json(&json!({
            "model": "claude-3-5-sonnet",
            "messages": [{"role": "user", "content": "ping"}],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response.text().await.unwrap();

    // P1: exactly the `message_start (content_block_start content_block_delta*
    // content_block_stop)* message_delta message_stop` lifecycle, each frame
    // framed as `event: <name>\ndata: <json>\n\n`.
    let event_names: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect();

    assert_eq!(
        event_names,
        vec![
            "message_start",
            "content_block_start",
            "content_block_delta",
            "content_block_delta",
            "content_block_stop",
            "message_delta",
            "message_stop",
        ]
    );

    for chunk in body.split("\n\n").filter(|chunk| !chunk.is_empty()) {
        assert!(chunk.starts_with("event: "));
        let data_line = chunk.lines().nth(1).expect("each frame has a data line");
        assert!(data_line.starts_with("data: "));
        let payload = data_line.trim_start_matches("data: ");
        let _: Value = serde_json::from_str(payload).expect("frame data is valid JSON");
    }

    assert!(body.contains("\"model\":\"claude-3-5-sonnet\""));
    assert!(body.contains("\"stop_reason\":\"end_turn\""));
}
