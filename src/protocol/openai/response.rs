use serde::Deserialize;

/// Terminal upstream response envelope, whether returned directly by a
/// non-streaming call or embedded in a `response.completed` / `response.failed`
/// / `response.incomplete` streaming event.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    pub id: String,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub output: Vec<OutputItem>,

    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,

    #[serde(default)]
    pub usage: Option<ResponsesUsage>,

    #[serde(default)]
    pub error: Option<ResponsesError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncompleteDetails {
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ResponsesUsage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// One entry of the upstream `output` array. Reasoning items and anything
/// else the gateway does not surface to clients fall into `Unknown`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        content: Vec<OutputContentPart>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContentPart {
    OutputText { text: String },
    #[serde(other)]
    Unknown,
}
