use serde::{Deserialize, Serialize};

use crate::protocol::unknown_fields::UnknownFields;

use super::{Message, ToolChoice, ToolDef};

/// Inbound request body for `/v1/messages` and its siblings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesRequest {
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,

    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub stream: bool,

    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

/// Either a bare string or an ordered sequence of text parts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<SystemTextBlock>),
}

impl SystemPrompt {
    /// String form is taken verbatim; sequence form is joined with `\n`.
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemTextBlock {
    #[serde(rename = "type", default)]
    pub r#type: Option<String>,
    pub text: String,
}
