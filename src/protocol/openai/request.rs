use serde::Serialize;
use serde_json::Value;

/// Mapped request body sent to the upstream `/responses` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    pub input: Vec<InputItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoiceSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message {
        role: &'static str,
        content: Vec<InputContentPart>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum InputContentPart {
    #[serde(rename = "input_text")]
    InputText { text: String },
    #[serde(rename = "output_text")]
    OutputText { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub function: FunctionSpec,
}

impl ToolSpec {
    pub fn function(function: FunctionSpec) -> Self {
        Self {
            r#type: "function",
            function,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolChoiceSpec {
    Mode(&'static str),
    Named {
        #[serde(rename = "type")]
        r#type: &'static str,
        function: NamedFunction,
    },
}

impl ToolChoiceSpec {
    pub fn named(name: String) -> Self {
        Self::Named {
            r#type: "function",
            function: NamedFunction { name },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedFunction {
    pub name: String,
}
