use serde::Deserialize;

use super::{OutputContentPart, OutputItem, ResponsesResponse};

/// The subset of the upstream Responses API SSE event taxonomy the
/// translator understands. Anything else deserializes into `Unknown` and is
/// ignored (logged at debug level).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseEvent {
    #[serde(rename = "response.created")]
    Created { response: ResponsesResponse },

    #[serde(rename = "response.output_item.added")]
    OutputItemAdded { output_index: u32, item: OutputItem },

    #[serde(rename = "response.output_item.done")]
    OutputItemDone { output_index: u32, item: OutputItem },

    #[serde(rename = "response.content_part.added")]
    ContentPartAdded {
        output_index: u32,
        content_index: u32,
        part: OutputContentPart,
    },

    #[serde(rename = "response.content_part.done")]
    ContentPartDone {
        output_index: u32,
        content_index: u32,
        part: OutputContentPart,
    },

    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        output_index: u32,
        content_index: u32,
        delta: String,
    },

    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta { output_index: u32, delta: String },

    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        output_index: u32,
        #[serde(default)]
        arguments: Option<String>,
    },

    #[serde(rename = "response.completed")]
    Completed { response: ResponsesResponse },

    #[serde(rename = "response.incomplete")]
    Incomplete { response: ResponsesResponse },

    #[serde(rename = "response.failed")]
    Failed { response: ResponsesResponse },

    #[serde(rename = "ping")]
    Ping,

    /// Any event name this gateway doesn't act on (reasoning deltas, audio,
    /// image partials, ...). Dropped by the translator.
    #[serde(other)]
    Unknown,
}
