use crate::{
    error::{GatewayError, Result},
    protocol::anthropic::messages::{ContentBlock, MessagesRequest, Role, ToolChoice},
    protocol::openai::{FunctionSpec, InputContentPart, InputItem, ResponsesRequest, ToolChoiceSpec, ToolSpec},
};

/// Translates a validated `MessagesRequest` plus the resolved upstream model
/// name into a mapped `ResponsesRequest`.
pub fn map_request(request: &MessagesRequest, resolved_model: String) -> Result<ResponsesRequest> {
    if request.messages.is_empty() {
        return Err(GatewayError::InvalidRequest("messages must not be empty".to_string()));
    }

    let instructions = request
        .system
        .as_ref()
        .map(|system| system.flatten())
        .filter(|text| !text.is_empty());

    let mut input = Vec::new();
    for message in &request.messages {
        map_message(message, &mut input)?;
    }

    let declared_tool_names: Vec<&str> = request
        .tools
        .as_ref()
        .map(|tools| tools.iter().map(|tool| tool.name.as_str()).collect())
        .unwrap_or_default();

    let tools = request.tools.as_ref().filter(|tools| !tools.is_empty()).map(|tools| {
        tools
            .iter()
            .map(|tool| {
                ToolSpec::function(FunctionSpec {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
            })
            .collect()
    });

    let tool_choice = request
        .tool_choice
        .as_ref()
        .map(|choice| map_tool_choice(choice, &declared_tool_names))
        .transpose()?;

    Ok(ResponsesRequest {
        model: resolved_model,
        instructions,
        input,
        tools,
        tool_choice,
        max_output_tokens: request.max_tokens,
        stream: request.stream,
    })
}

fn map_message(message: &crate::protocol::anthropic::messages::Message, input: &mut Vec<InputItem>) -> Result<()> {
    let blocks = message.content.as_blocks();
    let role_str = match message.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    let mut text_parts = Vec::new();
    let mut tool_items = Vec::new();

    for block in &blocks {
        match block {
            ContentBlock::Text { text } => {
                let part = if message.role == Role::Assistant {
                    InputContentPart::OutputText { text: text.clone() }
                } else {
                    InputContentPart::InputText { text: text.clone() }
                };
                text_parts.push(part);
            }
            ContentBlock::ToolUse { id, name, input: args } => {
                if message.role != Role::Assistant {
                    return Err(GatewayError::InvalidRequest(
                        "tool_use blocks may only appear in assistant messages".to_string(),
                    ));
                }
                let arguments = serde_json::to_string(args)
                    .map_err(|err| GatewayError::InvalidRequest(format!("failed to serialize tool_use input: {err}")))?;
                tool_items.push(InputItem::FunctionCall {
                    call_id: id.clone(),
                    name: name.clone(),
                    arguments,
                });
            }
            ContentBlock::ToolResult {
                tool_use_id, content, ..
            } => {
                if message.role != Role::User {
                    return Err(GatewayError::InvalidRequest(
                        "tool_result blocks may only appear in user messages".to_string(),
                    ));
                }
                let output = content.as_ref().map(|content| content.flatten()).unwrap_or_default();
                tool_items.push(InputItem::FunctionCallOutput {
                    call_id: tool_use_id.clone(),
                    output,
                });
            }
            ContentBlock::Unknown => {
                return Err(GatewayError::InvalidRequest(
                    "unsupported content block kind".to_string(),
                ));
            }
        }
    }

    if !text_parts.is_empty() {
        input.push(InputItem::Message {
            role: role_str,
            content: text_parts,
        });
    }
    input.extend(tool_items);

    Ok(())
}

fn map_tool_choice(choice: &ToolChoice, declared: &[&str]) -> Result<ToolChoiceSpec> {
    match choice {
        ToolChoice::Auto => Ok(ToolChoiceSpec::Mode("auto")),
        ToolChoice::Any => Ok(ToolChoiceSpec::Mode("required")),
        ToolChoice::None => Ok(ToolChoiceSpec::Mode("none")),
        ToolChoice::Tool { name } => {
            if !declared.contains(&name.as_str()) {
                return Err(GatewayError::InvalidRequest(format!(
                    "tool_choice references undeclared tool '{name}'"
                )));
            }
            Ok(ToolChoiceSpec::named(name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::protocol::anthropic::messages::{Message, MessageContent};

    fn user_text(text: &str) -> Message {
        Message {
            role: Role::User,
            content: MessageContent::Text(text.to_string()),
            unknown_fields: Default::default(),
        }
    }

    #[test]
    fn rejects_empty_messages() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet".to_string(),
            system: None,
            messages: vec![],
            tools: None,
            tool_choice: None,
            max_tokens: None,
            stream: false,
            unknown_fields: Default::default(),
        };

        assert!(map_request(&request, "gpt-4o".to_string()).is_err());
    }

    #[test]
    fn maps_simple_text_message() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet".to_string(),
            system: None,
            messages: vec![user_text("ping")],
            tools: None,
            tool_choice: None,
            max_tokens: Some(256),
            stream: false,
            unknown_fields: Default::default(),
        };

        let mapped = map_request(&request, "gpt-4o".to_string()).unwrap();
        assert_eq!(mapped.model, "gpt-4o");
        assert_eq!(mapped.max_output_tokens, Some(256));
        assert_eq!(mapped.input.len(), 1);
        match &mapped.input[0] {
            InputItem::Message { role, content } => {
                assert_eq!(*role, "user");
                assert_eq!(content.len(), 1);
            }
            _ => panic!("expected a message input item"),
        }
    }

    #[test]
    fn rejects_tool_use_in_user_message() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet".to_string(),
            system: None,
            messages: vec![Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                    id: "t1".to_string(),
                    name: "get_weather".to_string(),
                    input: json!({}),
                }]),
                unknown_fields: Default::default(),
            }],
            tools: None,
            tool_choice: None,
            max_tokens: None,
            stream: false,
            unknown_fields: Default::default(),
        };

        assert!(map_request(&request, "gpt-4o".to_string()).is_err());
    }
}
