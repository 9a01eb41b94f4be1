use serde_json::Value;

use crate::protocol::anthropic::messages::Usage;

/// Narrow logging collaborator. Payload redaction is the sink's
/// responsibility; the core passes unredacted structures and trusts it.
pub trait Sink: Send + Sync {
    fn log(&self, event_name: &str, fields: LogFields<'_>);
}

#[derive(Default)]
pub struct LogFields<'a> {
    pub correlation_id: &'a str,
    pub request_payload: Option<&'a Value>,
    pub response_payload: Option<&'a Value>,
    pub usage: Option<Usage>,
    pub error: Option<&'a str>,
}

/// Default sink: forwards to the `log` facade at debug level.
pub struct LogSink;

impl Sink for LogSink {
    fn log(&self, event_name: &str, fields: LogFields<'_>) {
        log::debug!(
            "{event_name} correlation_id={} request={} response={} usage={:?}",
            fields.correlation_id,
            fields.request_payload.map(Value::to_string).unwrap_or_default(),
            fields.response_payload.map(Value::to_string).unwrap_or_default(),
            fields.usage.map(|u| (u.input_tokens, u.output_tokens)),
        );

        if let Some(error) = fields.error {
            log::error!("{event_name} correlation_id={} error={error}", fields.correlation_id);
        }
    }
}

/// No-op sink used in tests and wherever observability is not configured.
/// The core performs no logging when this sink is installed.
pub struct NoopSink;

impl Sink for NoopSink {
    fn log(&self, _event_name: &str, _fields: LogFields<'_>) {}
}
