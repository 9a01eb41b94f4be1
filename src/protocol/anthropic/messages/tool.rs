use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::unknown_fields::UnknownFields;

/// A function the model may invoke, declared by the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolDef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema describing the tool's input. Anthropic's wire format
    /// names this field `input_schema`; the abstract name is `parameters`.
    #[serde(rename = "input_schema")]
    pub parameters: Value,

    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

/// How the model should pick (or avoid) a tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
    Any,
    None,
    Tool { name: String },
}
