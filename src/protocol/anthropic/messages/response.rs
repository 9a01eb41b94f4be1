use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound, non-streaming response body for `/v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesResponse {
    pub id: String,

    #[serde(rename = "type")]
    pub r#type: &'static str,

    pub role: &'static str,

    /// Echoes the *inbound* model name, not the resolved upstream name.
    pub model: String,

    pub content: Vec<ResponseContentBlock>,

    pub stop_reason: Option<StopReason>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,

    pub usage: Usage,
}

impl MessagesResponse {
    pub fn new(id: String, model: String, content: Vec<ResponseContentBlock>, stop_reason: Option<StopReason>, usage: Usage) -> Self {
        Self {
            id,
            r#type: "message",
            role: "assistant",
            model,
            content,
            stop_reason,
            stop_sequence: None,
            usage,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
        /// Set only when the upstream `arguments` string failed to parse as
        /// JSON; `input` is then the empty object and this carries the raw
        /// text for debugging.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        raw_arguments: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ToolUse,
    Refusal,
    StopSequence,
    PauseTurn,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
