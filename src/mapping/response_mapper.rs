use crate::protocol::anthropic::messages::{ResponseContentBlock, StopReason, Usage};
use crate::protocol::openai::{OutputContentPart, OutputItem, ResponsesResponse};

/// Translates a terminal upstream response envelope into the content blocks,
/// stop reason, and usage of an outbound `MessagesResponse`.
pub fn map_response(response: &ResponsesResponse) -> (Vec<ResponseContentBlock>, StopReason, Usage) {
    let content = assemble_content(&response.output);
    let stop_reason = derive_stop_reason(response);
    let usage = Usage {
        input_tokens: response.usage.and_then(|u| u.input_tokens).unwrap_or(0),
        output_tokens: response.usage.and_then(|u| u.output_tokens).unwrap_or(0),
    };

    (content, stop_reason, usage)
}

pub fn assemble_content(output: &[OutputItem]) -> Vec<ResponseContentBlock> {
    let mut content = Vec::new();

    for item in output {
        match item {
            OutputItem::Message { content: parts, .. } => {
                for part in parts {
                    match part {
                        OutputContentPart::OutputText { text } => {
                            content.push(ResponseContentBlock::Text { text: text.clone() });
                        }
                        OutputContentPart::Unknown => {}
                    }
                }
            }
            OutputItem::FunctionCall { call_id, name, arguments } => {
                let (input, raw_arguments) = match serde_json::from_str(arguments) {
                    Ok(parsed) => (parsed, None),
                    Err(_) => (serde_json::Value::Object(Default::default()), Some(arguments.clone())),
                };
                content.push(ResponseContentBlock::ToolUse {
                    id: call_id.clone(),
                    name: name.clone(),
                    input,
                    raw_arguments,
                });
            }
            OutputItem::Unknown => {}
        }
    }

    content
}

pub fn derive_stop_reason(response: &ResponsesResponse) -> StopReason {
    let has_function_call = response.output.iter().any(|item| matches!(item, OutputItem::FunctionCall { .. }));

    if has_function_call {
        return StopReason::ToolUse;
    }

    if let Some(details) = &response.incomplete_details {
        match details.reason.as_str() {
            "max_output_tokens" => return StopReason::MaxTokens,
            "content_filter" => return StopReason::Refusal,
            _ => {
                if response.status.as_deref() == Some("incomplete") {
                    return StopReason::PauseTurn;
                }
            }
        }
    }

    if response.status.as_deref() == Some("incomplete") {
        return StopReason::PauseTurn;
    }

    StopReason::EndTurn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(output: Vec<OutputItem>, status: Option<&str>) -> ResponsesResponse {
        ResponsesResponse {
            id: "resp_1".to_string(),
            status: status.map(str::to_string),
            output,
            incomplete_details: None,
            usage: None,
            error: None,
        }
    }

    #[test]
    fn simple_completion_maps_to_end_turn() {
        let response = response_with(
            vec![OutputItem::Message {
                role: Some("assistant".to_string()),
                content: vec![OutputContentPart::OutputText {
                    text: "pong".to_string(),
                }],
            }],
            Some("completed"),
        );

        let (content, stop_reason, _usage) = map_response(&response);
        assert_eq!(content.len(), 1);
        assert_eq!(stop_reason, StopReason::EndTurn);
    }

    #[test]
    fn function_call_maps_to_tool_use() {
        let response = response_with(
            vec![
                OutputItem::Message {
                    role: Some("assistant".to_string()),
                    content: vec![OutputContentPart::OutputText {
                        text: "Let me check.".to_string(),
                    }],
                },
                OutputItem::FunctionCall {
                    call_id: "c1".to_string(),
                    name: "get_weather".to_string(),
                    arguments: r#"{"city":"SF"}"#.to_string(),
                },
            ],
            Some("completed"),
        );

        let (content, stop_reason, _usage) = map_response(&response);
        assert_eq!(content.len(), 2);
        assert_eq!(stop_reason, StopReason::ToolUse);
    }

    #[test]
    fn unparseable_arguments_fall_back_to_empty_object_with_raw_preserved() {
        let response = response_with(
            vec![OutputItem::FunctionCall {
                call_id: "c1".to_string(),
                name: "get_weather".to_string(),
                arguments: "{not json".to_string(),
            }],
            Some("completed"),
        );

        let (content, _, _) = map_response(&response);
        match &content[0] {
            ResponseContentBlock::ToolUse { input, raw_arguments, .. } => {
                assert_eq!(*input, serde_json::Value::Object(Default::default()));
                assert_eq!(raw_arguments.as_deref(), Some("{not json"));
            }
            other => panic!("expected a tool_use block: {other:?}"),
        }
    }

    #[test]
    fn max_output_tokens_maps_to_max_tokens() {
        let mut response = response_with(vec![], Some("incomplete"));
        response.incomplete_details = Some(crate::protocol::openai::IncompleteDetails {
            reason: "max_output_tokens".to_string(),
        });

        assert_eq!(derive_stop_reason(&response), StopReason::MaxTokens);
    }

    #[test]
    fn assembled_response_matches_the_anthropic_envelope_shape() {
        use crate::protocol::anthropic::messages::MessagesResponse;

        let response = response_with(
            vec![
                OutputItem::Message {
                    role: Some("assistant".to_string()),
                    content: vec![OutputContentPart::OutputText {
                        text: "I'll check that for you.".to_string(),
                    }],
                },
                OutputItem::FunctionCall {
                    call_id: "call_abc".to_string(),
                    name: "get_weather".to_string(),
                    arguments: r#"{"city":"SF"}"#.to_string(),
                },
            ],
            Some("completed"),
        );

        let (content, stop_reason, usage) = map_response(&response);
        let message = MessagesResponse::new("msg_1".to_string(), "claude-3-5-sonnet".to_string(), content, Some(stop_reason), usage);

        insta::assert_json_snapshot!(message, @r###"
        {
          "id": "msg_1",
          "type": "message",
          "role": "assistant",
          "model": "claude-3-5-sonnet",
          "content": [
            {
              "type": "text",
              "text": "I'll check that for you."
            },
            {
              "type": "tool_use",
              "id": "call_abc",
              "name": "get_weather",
              "input": {
                "city": "SF"
              }
            }
          ],
          "stop_reason": "tool_use",
          "usage": {
            "input_tokens": 0,
            "output_tokens": 0
          }
        }
        "###);
    }
}
