use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::error::StreamParseError;
use crate::message::ImageRef;

/// One server-sent event as it came off the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// `event:` field; absent when the server omitted it.
    pub event: Option<String>,
    /// `data:` field (multi-line data joined by `\n`).
    pub data: Option<String>,
}

impl RawEvent {
    /// Creates a named event with a data payload.
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: Some(data.into()),
        }
    }

    /// Event name, or `""` when absent.
    pub fn name(&self) -> &str {
        self.event.as_deref().unwrap_or("")
    }

    /// Whether the event carries a non-empty data payload.
    pub fn has_data(&self) -> bool {
        self.data.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Typed chat stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Session established; carries the backend session id when present.
    Init { session_id: Option<String> },
    /// Intermediate processing status.
    Presence { label: Option<String> },
    /// Incremental response text.
    Delta { text: Option<String> },
    /// Wallet operation requiring confirmation.
    Action(Action),
    /// Image attached to the response.
    Image(ImageRef),
    /// Informational context update (chain ids, wallet address, ...).
    Context(Value),
    /// Backend-reported failure for this turn.
    Error { message: Option<String> },
    /// Turn completed.
    Done,
    /// Event name outside the known vocabulary.
    Ignored { event: String },
}

#[derive(Debug, Default, Deserialize)]
struct InitPayload {
    #[serde(default)]
    session_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPayload {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaPayload {
    #[serde(default)]
    v: Option<Value>,
}

fn string_field(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl StreamEvent {
    /// Parses a raw event's JSON payload according to its event name.
    ///
    /// Unknown names map to [`StreamEvent::Ignored`] without touching the
    /// payload. Known names require `data` to be valid JSON matching the
    /// event's schema.
    pub fn parse(raw: &RawEvent) -> Result<Self, StreamParseError> {
        let name = raw.name();
        let kind = match name {
            "init" | "presence" | "delta" | "action" | "image" | "context" | "error" | "done" => {
                name
            }
            other => {
                return Ok(StreamEvent::Ignored {
                    event: other.to_string(),
                });
            }
        };

        let json: Value = serde_json::from_str(raw.data.as_deref().unwrap_or("")).map_err(|e| {
            StreamParseError::InvalidJson {
                event: kind.to_string(),
                reason: e.to_string(),
            }
        })?;
        let invalid = |e: serde_json::Error| StreamParseError::InvalidPayload {
            event: kind.to_string(),
            reason: e.to_string(),
        };
        // Field lookups below tolerate non-object payloads: fields are simply absent.
        let object = if json.is_object() {
            json.clone()
        } else {
            Value::Object(Default::default())
        };

        let event = match kind {
            "init" => {
                let p: InitPayload = serde_json::from_value(object).map_err(invalid)?;
                StreamEvent::Init {
                    session_id: string_field(p.session_id).filter(|id| !id.is_empty()),
                }
            }
            "presence" => {
                let p: DataPayload = serde_json::from_value(object).map_err(invalid)?;
                StreamEvent::Presence {
                    label: string_field(p.data).filter(|l| !l.is_empty()),
                }
            }
            "delta" => {
                let p: DeltaPayload = serde_json::from_value(object).map_err(invalid)?;
                StreamEvent::Delta {
                    text: string_field(p.v),
                }
            }
            "action" => StreamEvent::Action(serde_json::from_value(json).map_err(invalid)?),
            "image" => StreamEvent::Image(serde_json::from_value(json).map_err(invalid)?),
            "context" => StreamEvent::Context(json),
            "error" => {
                let p: DataPayload = serde_json::from_value(object).map_err(invalid)?;
                StreamEvent::Error {
                    message: string_field(p.data).filter(|m| !m.is_empty()),
                }
            }
            _ => StreamEvent::Done,
        };
        Ok(event)
    }

    /// Whether this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error { .. } | StreamEvent::Done)
    }

    /// Whether this event carries response content and hides the thinking indicator.
    pub fn clears_thinking(&self) -> bool {
        matches!(
            self,
            StreamEvent::Delta { .. }
                | StreamEvent::Action(_)
                | StreamEvent::Image(_)
                | StreamEvent::Error { .. }
                | StreamEvent::Done
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(event: &str, data: &str) -> Result<StreamEvent, StreamParseError> {
        StreamEvent::parse(&RawEvent::new(event, data))
    }

    #[test]
    fn parses_init_with_session_id() {
        let event = parse("init", r#"{"session_id":"s1","request_id":"r1"}"#).expect("init");
        assert_eq!(
            event,
            StreamEvent::Init {
                session_id: Some("s1".to_string())
            }
        );
    }

    #[test]
    fn delta_without_v_parses_to_empty_delta() {
        let event = parse("delta", "{}").expect("delta");
        assert_eq!(event, StreamEvent::Delta { text: None });
        assert!(event.clears_thinking());
    }

    #[test]
    fn presence_requires_string_label() {
        let event = parse("presence", r#"{"data":42}"#).expect("presence");
        assert_eq!(event, StreamEvent::Presence { label: None });
    }

    #[test]
    fn empty_session_id_and_presence_label_are_absent() {
        assert_eq!(
            parse("init", r#"{"session_id":""}"#).expect("init"),
            StreamEvent::Init { session_id: None }
        );
        assert_eq!(
            parse("presence", r#"{"data":""}"#).expect("presence"),
            StreamEvent::Presence { label: None }
        );
    }

    #[test]
    fn image_requires_full_schema() {
        let ok = parse("image", r#"{"url":"https://x/y.png","width":10,"height":20}"#)
            .expect("image");
        assert!(matches!(ok, StreamEvent::Image(ref img) if img.width == 10));

        let err = parse("image", r#"{"url":"https://x/y.png"}"#).expect_err("missing dims");
        assert!(matches!(err, StreamParseError::InvalidPayload { .. }));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse("delta", "{not json").expect_err("malformed");
        assert!(matches!(err, StreamParseError::InvalidJson { .. }));
    }

    #[test]
    fn unknown_event_is_ignored_without_parsing() {
        let event = parse("heartbeat", "not even json").expect("ignored");
        assert_eq!(
            event,
            StreamEvent::Ignored {
                event: "heartbeat".to_string()
            }
        );
        assert!(!event.clears_thinking());
    }

    #[test]
    fn error_and_done_are_terminal() {
        let error = parse("error", r#"{"data":"boom"}"#).expect("error");
        assert_eq!(
            error,
            StreamEvent::Error {
                message: Some("boom".to_string())
            }
        );
        assert!(error.is_terminal());
        assert!(parse("done", "{}").expect("done").is_terminal());
        assert!(!parse("context", "{}").expect("context").is_terminal());
    }

    #[test]
    fn raw_event_has_data_treats_empty_as_absent() {
        assert!(!RawEvent::default().has_data());
        assert!(
            !RawEvent {
                event: Some("done".into()),
                data: Some(String::new())
            }
            .has_data()
        );
        assert!(RawEvent::new("done", "{}").has_data());
    }
}
