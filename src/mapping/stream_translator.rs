use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::mapping::response_mapper::derive_stop_reason;
use crate::protocol::anthropic::error::Error as AnthropicError;
use crate::protocol::anthropic::messages::{
    Delta, DeltaUsage, MessageDeltaFields, MessagesResponse, StartBlock, StopReason, StreamEvent, Usage,
};
use crate::protocol::openai::{OutputContentPart, OutputItem, ResponseEvent, ResponsesResponse};

/// Soft cap on a single tool-call's accumulated argument JSON. Exceeding it
/// closes the stream with an `invalid_request_error` rather than growing
/// the buffer unbounded.
const TOOL_ARGS_SOFT_CAP_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    ToolUse,
}

/// A stateful transducer: consumes upstream Responses-API SSE events and
/// emits downstream Messages-API SSE events obeying the strict
/// `message_start (block_open delta* block_close)* message_delta message_stop`
/// lifecycle. Owned exclusively by the coroutine driving one streaming
/// request; holds no state shared across requests.
pub struct StreamState {
    model_inbound: String,
    input_tokens: u32,

    message_id: Option<String>,
    next_block_index: u32,

    open_blocks: HashMap<u32, BlockKind>,
    closed_blocks: HashSet<u32>,

    text_block_by_part: HashMap<(u32, u32), u32>,
    tool_block_by_item: HashMap<u32, u32>,

    tool_buffers: HashMap<u32, String>,
    tool_meta: HashMap<u32, (String, String)>,
    finalized_tool_inputs: HashMap<u32, Value>,

    output_tokens: u32,
    terminal: bool,
}

impl StreamState {
    /// `input_tokens` is precomputed by the Token Counter from the mapped
    /// payload before the upstream connection is even opened.
    pub fn new(model_inbound: String, input_tokens: u32) -> Self {
        Self {
            model_inbound,
            input_tokens,
            message_id: None,
            next_block_index: 0,
            open_blocks: HashMap::new(),
            closed_blocks: HashSet::new(),
            text_block_by_part: HashMap::new(),
            tool_block_by_item: HashMap::new(),
            tool_buffers: HashMap::new(),
            tool_meta: HashMap::new(),
            finalized_tool_inputs: HashMap::new(),
            output_tokens: 0,
            terminal: false,
        }
    }

    /// Whether the stream has reached a terminal state (`message_stop` or a
    /// mid-stream `error` already emitted). Once true, the driving loop
    /// must stop calling `apply`.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// The finalized, parsed input for a closed `tool_use` block. Exposed
    /// for verifying tool-input atomicity; not part of the wire payload.
    pub fn finalized_tool_input(&self, index: u32) -> Option<&Value> {
        self.finalized_tool_inputs.get(&index)
    }

    fn next_index(&mut self) -> u32 {
        let index = self.next_block_index;
        self.next_block_index += 1;
        index
    }

    /// Applies one upstream event, returning zero or more downstream frames.
    pub fn apply(&mut self, event: ResponseEvent) -> Vec<StreamEvent> {
        if self.terminal {
            return Vec::new();
        }

        match event {
            ResponseEvent::Created { response } => self.on_created(response),
            ResponseEvent::OutputItemAdded { output_index, item } => self.on_output_item_added(output_index, item),
            ResponseEvent::OutputItemDone { output_index, item } => self.on_output_item_done(output_index, item),
            ResponseEvent::ContentPartAdded {
                output_index,
                content_index,
                part,
            } => self.on_content_part_added(output_index, content_index, part),
            ResponseEvent::ContentPartDone {
                output_index,
                content_index,
                ..
            } => self.close_text_block(output_index, content_index),
            ResponseEvent::OutputTextDelta {
                output_index,
                content_index,
                delta,
            } => self.on_text_delta(output_index, content_index, delta),
            ResponseEvent::FunctionCallArgumentsDelta { output_index, delta } => {
                self.on_function_call_delta(output_index, delta)
            }
            ResponseEvent::FunctionCallArgumentsDone { output_index, arguments } => {
                self.close_tool_block(output_index, arguments)
            }
            ResponseEvent::Completed { response } => self.on_terminal(response, false),
            ResponseEvent::Incomplete { response } => self.on_terminal(response, false),
            ResponseEvent::Failed { response } => self.on_terminal(response, true),
            ResponseEvent::Ping => vec![StreamEvent::Ping],
            ResponseEvent::Unknown => Vec::new(),
        }
    }

    /// Called by the driving loop when the upstream connection ends without
    /// a terminal event (`response.completed`/`failed`/`incomplete`).
    pub fn finalize_on_early_end(&mut self) -> Vec<StreamEvent> {
        if self.terminal {
            return Vec::new();
        }

        let mut frames = self.close_all_open_blocks();
        frames.push(StreamEvent::MessageDelta {
            delta: MessageDeltaFields {
                stop_reason: Some(StopReason::EndTurn),
                stop_sequence: None,
            },
            usage: DeltaUsage {
                output_tokens: self.output_tokens,
            },
        });
        frames.push(StreamEvent::MessageStop);
        self.terminal = true;
        frames
    }

    fn on_created(&mut self, response: ResponsesResponse) -> Vec<StreamEvent> {
        self.message_id = Some(response.id.clone());

        let message = MessagesResponse::new(
            response.id,
            self.model_inbound.clone(),
            Vec::new(),
            None,
            Usage {
                input_tokens: self.input_tokens,
                output_tokens: 0,
            },
        );

        vec![StreamEvent::MessageStart { message }]
    }

    fn on_output_item_added(&mut self, output_index: u32, item: OutputItem) -> Vec<StreamEvent> {
        match item {
            OutputItem::FunctionCall { call_id, name, .. } => {
                let index = self.next_index();
                self.open_blocks.insert(index, BlockKind::ToolUse);
                self.tool_block_by_item.insert(output_index, index);
                self.tool_meta.insert(index, (call_id.clone(), name.clone()));
                self.tool_buffers.insert(index, String::new());

                vec![StreamEvent::ContentBlockStart {
                    index,
                    content_block: StartBlock::ToolUse {
                        id: call_id,
                        name,
                        input: Value::Object(Default::default()),
                    },
                }]
            }
            OutputItem::Message { .. } | OutputItem::Unknown => Vec::new(),
        }
    }

    fn on_output_item_done(&mut self, output_index: u32, item: OutputItem) -> Vec<StreamEvent> {
        match item {
            OutputItem::FunctionCall { .. } => self.close_tool_block(output_index, None),
            OutputItem::Message { .. } => {
                // Close any text blocks still open for this item; content_index is
                // usually 0 for a single text part per message item.
                let keys: Vec<(u32, u32)> = self
                    .text_block_by_part
                    .keys()
                    .filter(|(idx, _)| *idx == output_index)
                    .copied()
                    .collect();

                keys.into_iter()
                    .flat_map(|(idx, content_index)| self.close_text_block(idx, content_index))
                    .collect()
            }
            OutputItem::Unknown => Vec::new(),
        }
    }

    fn on_content_part_added(&mut self, output_index: u32, content_index: u32, part: OutputContentPart) -> Vec<StreamEvent> {
        match part {
            OutputContentPart::OutputText { .. } => {
                if self.text_block_by_part.contains_key(&(output_index, content_index)) {
                    return Vec::new();
                }

                let index = self.next_index();
                self.open_blocks.insert(index, BlockKind::Text);
                self.text_block_by_part.insert((output_index, content_index), index);

                vec![StreamEvent::ContentBlockStart {
                    index,
                    content_block: StartBlock::Text { text: String::new() },
                }]
            }
            OutputContentPart::Unknown => Vec::new(),
        }
    }

    fn on_text_delta(&mut self, output_index: u32, content_index: u32, delta: String) -> Vec<StreamEvent> {
        let index = *self
            .text_block_by_part
            .entry((output_index, content_index))
            .or_insert_with(|| {
                let index = self.next_block_index;
                self.next_block_index += 1;
                self.open_blocks.insert(index, BlockKind::Text);
                index
            });

        vec![StreamEvent::ContentBlockDelta {
            index,
            delta: Delta::TextDelta { text: delta },
        }]
    }

    fn close_text_block(&mut self, output_index: u32, content_index: u32) -> Vec<StreamEvent> {
        let Some(index) = self.text_block_by_part.remove(&(output_index, content_index)) else {
            return Vec::new();
        };

        if !self.closed_blocks.insert(index) {
            return Vec::new();
        }

        self.open_blocks.remove(&index);
        vec![StreamEvent::ContentBlockStop { index }]
    }

    fn on_function_call_delta(&mut self, output_index: u32, delta: String) -> Vec<StreamEvent> {
        let Some(&index) = self.tool_block_by_item.get(&output_index) else {
            return Vec::new();
        };

        let buffer = self.tool_buffers.entry(index).or_default();
        if buffer.len() + delta.len() > TOOL_ARGS_SOFT_CAP_BYTES {
            self.terminal = true;
            return vec![StreamEvent::Error {
                error: AnthropicError::invalid_request_error("tool arguments exceeded the per-block size limit"),
            }];
        }
        buffer.push_str(&delta);

        vec![StreamEvent::ContentBlockDelta {
            index,
            delta: Delta::InputJsonDelta { partial_json: delta },
        }]
    }

    fn close_tool_block(&mut self, output_index: u32, arguments_override: Option<String>) -> Vec<StreamEvent> {
        let Some(index) = self.tool_block_by_item.remove(&output_index) else {
            return Vec::new();
        };

        if !self.closed_blocks.insert(index) {
            return Vec::new();
        }

        self.open_blocks.remove(&index);

        let raw = arguments_override
            .or_else(|| self.tool_buffers.remove(&index))
            .unwrap_or_default();

        let parsed = if raw.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&raw).unwrap_or_else(|_| Value::Object(Default::default()))
        };

        self.finalized_tool_inputs.insert(index, parsed);

        vec![StreamEvent::ContentBlockStop { index }]
    }

    fn close_all_open_blocks(&mut self) -> Vec<StreamEvent> {
        let open_indices: Vec<u32> = self.open_blocks.keys().copied().collect();
        let mut frames = Vec::new();

        for index in open_indices {
            if !self.closed_blocks.insert(index) {
                continue;
            }

            if self.tool_buffers.contains_key(&index) {
                let raw = self.tool_buffers.remove(&index).unwrap_or_default();
                let parsed = serde_json::from_str(&raw).unwrap_or_else(|_| Value::Object(Default::default()));
                self.finalized_tool_inputs.insert(index, parsed);
            }

            frames.push(StreamEvent::ContentBlockStop { index });
        }

        self.open_blocks.clear();
        frames
    }

    fn on_terminal(&mut self, response: ResponsesResponse, failed: bool) -> Vec<StreamEvent> {
        if failed && self.message_id.is_some() {
            self.terminal = true;
            let message = response
                .error
                .and_then(|error| error.message)
                .unwrap_or_else(|| "upstream response failed".to_string());

            return vec![StreamEvent::Error {
                error: AnthropicError::api_error(message),
            }];
        }

        let mut frames = self.close_all_open_blocks();

        if let Some(usage) = response.usage {
            self.output_tokens = usage.output_tokens.unwrap_or(self.output_tokens);
        }

        let stop_reason = derive_stop_reason(&response);

        frames.push(StreamEvent::MessageDelta {
            delta: MessageDeltaFields {
                stop_reason: Some(stop_reason),
                stop_sequence: None,
            },
            usage: DeltaUsage {
                output_tokens: self.output_tokens,
            },
        });
        frames.push(StreamEvent::MessageStop);
        self.terminal = true;

        frames
    }
}
