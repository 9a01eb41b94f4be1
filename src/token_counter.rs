use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

use crate::protocol::openai::{InputContentPart, InputItem, ResponsesRequest};

/// Per-model-family constants for the reference counting algorithm. Values
/// mirror the common OpenAI chat-style overheads; unknown models use the
/// default profile and tokenizer.
struct ModelProfile {
    message_overhead: u32,
    call_overhead: u32,
    output_overhead: u32,
    tool_overhead: u32,
    reply_primer: u32,
}

const DEFAULT_PROFILE: ModelProfile = ModelProfile {
    message_overhead: 3,
    call_overhead: 3,
    output_overhead: 3,
    tool_overhead: 7,
    reply_primer: 3,
};

fn profile_for(_model: &str) -> &'static ModelProfile {
    &DEFAULT_PROFILE
}

fn encoder_for(model: &str) -> &'static CoreBPE {
    static O200K: OnceLock<CoreBPE> = OnceLock::new();
    static CL100K: OnceLock<CoreBPE> = OnceLock::new();

    if model.contains("gpt-4o") || model.contains("o1") || model.contains("o3") || model.contains("o4") {
        O200K.get_or_init(|| tiktoken_rs::o200k_base().expect("o200k_base encoder"))
    } else {
        CL100K.get_or_init(|| tiktoken_rs::cl100k_base().expect("cl100k_base encoder"))
    }
}

/// Computes the input token count for a mapped payload using the upstream
/// tokenizer's reference algorithm. Makes no network call.
pub fn count_input_tokens(request: &ResponsesRequest) -> u32 {
    let profile = profile_for(&request.model);
    let encoder = encoder_for(&request.model);
    let encode_len = |text: &str| encoder.encode_ordinary(text).len() as u32;

    let mut total = 0u32;

    if let Some(instructions) = &request.instructions {
        total += profile.message_overhead;
        total += encode_len(instructions);
    }

    for item in &request.input {
        match item {
            InputItem::Message { content, .. } => {
                total += profile.message_overhead;

                for part in content {
                    let text = match part {
                        InputContentPart::InputText { text } => text,
                        InputContentPart::OutputText { text } => text,
                    };
                    total += encode_len(text);
                }
            }
            InputItem::FunctionCall { name, arguments, .. } => {
                total += profile.call_overhead;
                total += encode_len(name);
                total += encode_len(arguments);
            }
            InputItem::FunctionCallOutput { call_id, output } => {
                total += profile.output_overhead;
                total += encode_len(call_id);
                total += encode_len(output);
            }
        }
    }

    if let Some(tools) = &request.tools {
        for tool in tools {
            total += profile.tool_overhead;
            total += encode_len(&tool.function.name);
            if let Some(description) = &tool.function.description {
                total += encode_len(description);
            }
            if let Ok(canonical) = serde_json::to_string(&tool.function.parameters) {
                total += encode_len(&canonical);
            }
        }
    }

    total += profile.reply_primer;

    total
}
