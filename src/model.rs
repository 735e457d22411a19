//! Domain events produced from the assistant event stream.

use serde::Serialize;
use serde_json::{Map, Value};

/// Message used when an `error` event carries neither `message` nor `error`.
pub const DEFAULT_ERROR_MESSAGE: &str = "Streaming request failed.";

/// One application-level event decoded from the stream.
///
/// The wire protocol multiplexes several channels over one body: assistant
/// text (`Delta`, `Done`), a secondary analysis channel (`AnalysisDelta`),
/// tabular output (`Row`) and lifecycle signals. Every frame maps to exactly
/// one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text.
    Delta { text: String },

    /// Incremental text on the analysis channel.
    AnalysisDelta { text: String },

    /// End of a response with its full text.
    Done {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        coverage_ids: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        anchor_terms_used: Option<Vec<String>>,
    },

    /// Error reported by the backend, or an unterminated frame at end of input.
    StreamError { message: String },

    /// One record of a table being generated.
    Row {
        row: Option<Value>,
        index: Option<u64>,
        total_rows: Option<u64>,
    },

    Init { fields: Map<String, Value> },

    Meta { fields: Map<String, Value> },

    /// Any event name without a dedicated variant, `message` included.
    Unknown { event: String, payload: Value },
}

impl StreamEvent {
    /// Map an event name and its decoded payload onto a variant.
    ///
    /// # Example
    /// ```
    /// use assist_stream::model::StreamEvent;
    /// use serde_json::json;
    ///
    /// let event = StreamEvent::from_wire("meta", json!({"mode": "analysis", "content": "hmm"}));
    /// assert_eq!(event, StreamEvent::AnalysisDelta { text: "hmm".to_string() });
    /// ```
    pub fn from_wire(event: &str, payload: Value) -> Self {
        match event {
            "delta" => StreamEvent::Delta {
                text: str_field(&payload, "content").unwrap_or_default(),
            },
            "done" => StreamEvent::Done {
                text: str_field(&payload, "content")
                    .or_else(|| str_field(&payload, "text"))
                    .unwrap_or_default(),
                coverage_ids: string_list(&payload, "coverage_ids"),
                anchor_terms_used: string_list(&payload, "anchor_terms_used"),
            },
            "error" => StreamEvent::StreamError {
                message: str_field(&payload, "message")
                    .or_else(|| str_field(&payload, "error"))
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            },
            "row" => StreamEvent::Row {
                row: payload.get("row").filter(|v| !v.is_null()).cloned(),
                index: payload.get("index").and_then(Value::as_u64),
                total_rows: payload.get("total_rows").and_then(Value::as_u64),
            },
            "init" => StreamEvent::Init {
                fields: into_fields(payload),
            },
            "meta" => {
                if payload.get("mode").and_then(Value::as_str) == Some("analysis") {
                    StreamEvent::AnalysisDelta {
                        text: str_field(&payload, "content").unwrap_or_default(),
                    }
                } else {
                    StreamEvent::Meta {
                        fields: into_fields(payload),
                    }
                }
            }
            other => StreamEvent::Unknown {
                event: other.to_string(),
                payload,
            },
        }
    }

    /// The snake_case variant name, as used in the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Delta { .. } => "delta",
            StreamEvent::AnalysisDelta { .. } => "analysis_delta",
            StreamEvent::Done { .. } => "done",
            StreamEvent::StreamError { .. } => "stream_error",
            StreamEvent::Row { .. } => "row",
            StreamEvent::Init { .. } => "init",
            StreamEvent::Meta { .. } => "meta",
            StreamEvent::Unknown { .. } => "unknown",
        }
    }

    /// Whether the event ends a response.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::StreamError { .. })
    }
}

fn str_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Read an array of ids or terms, rendering numbers as decimal strings.
fn string_list(payload: &Value, key: &str) -> Option<Vec<String>> {
    let items = payload.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    )
}

fn into_fields(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delta() {
        assert_eq!(
            StreamEvent::from_wire("delta", json!({"content": "Hi"})),
            StreamEvent::Delta { text: "Hi".to_string() }
        );
        assert_eq!(
            StreamEvent::from_wire("delta", json!({})),
            StreamEvent::Delta { text: String::new() }
        );
    }

    #[test]
    fn test_delta_with_malformed_payload() {
        // Raw text recovered by the payload decoder has no `content` key.
        assert_eq!(
            StreamEvent::from_wire("delta", json!({"error": "not-json"})),
            StreamEvent::Delta { text: String::new() }
        );
    }

    #[test]
    fn test_done_falls_back_to_text() {
        let event = StreamEvent::from_wire(
            "done",
            json!({"text": "final", "coverage_ids": ["a", 7, null], "anchor_terms_used": ["scope"]}),
        );
        assert_eq!(
            event,
            StreamEvent::Done {
                text: "final".to_string(),
                coverage_ids: Some(vec!["a".to_string(), "7".to_string()]),
                anchor_terms_used: Some(vec!["scope".to_string()]),
            }
        );
        assert!(event.is_terminal());
    }

    #[test]
    fn test_done_prefers_content() {
        assert_eq!(
            StreamEvent::from_wire("done", json!({"content": "c", "text": "t", "coverage_ids": "x"})),
            StreamEvent::Done {
                text: "c".to_string(),
                coverage_ids: None,
                anchor_terms_used: None,
            }
        );
    }

    #[test]
    fn test_error_message_chain() {
        assert_eq!(
            StreamEvent::from_wire("error", json!({"message": "m", "error": "e"})),
            StreamEvent::StreamError { message: "m".to_string() }
        );
        assert_eq!(
            StreamEvent::from_wire("error", json!({"error": "e"})),
            StreamEvent::StreamError { message: "e".to_string() }
        );
        assert_eq!(
            StreamEvent::from_wire("error", json!(null)),
            StreamEvent::StreamError { message: DEFAULT_ERROR_MESSAGE.to_string() }
        );
    }

    #[test]
    fn test_row() {
        assert_eq!(
            StreamEvent::from_wire("row", json!({"row": {"name": "A"}, "index": 2, "total_rows": 5})),
            StreamEvent::Row {
                row: Some(json!({"name": "A"})),
                index: Some(2),
                total_rows: Some(5),
            }
        );
        assert_eq!(
            StreamEvent::from_wire("row", json!({})),
            StreamEvent::Row { row: None, index: None, total_rows: None }
        );
    }

    #[test]
    fn test_meta_analysis_channel() {
        assert_eq!(
            StreamEvent::from_wire("meta", json!({"mode": "analysis", "content": "thinking"})),
            StreamEvent::AnalysisDelta { text: "thinking".to_string() }
        );

        let event = StreamEvent::from_wire("meta", json!({"mode": "sources", "count": 3}));
        match event {
            StreamEvent::Meta { fields } => {
                assert_eq!(fields.get("mode"), Some(&json!("sources")));
                assert_eq!(fields.get("count"), Some(&json!(3)));
            }
            other => panic!("expected meta, got {:?}", other),
        }
    }

    #[test]
    fn test_init_keeps_object_fields() {
        let event = StreamEvent::from_wire("init", json!({"session_id": "s1"}));
        assert_eq!(event.kind(), "init");
        match event {
            StreamEvent::Init { fields } => assert_eq!(fields.get("session_id"), Some(&json!("s1"))),
            other => panic!("expected init, got {:?}", other),
        }

        assert_eq!(
            StreamEvent::from_wire("init", json!([1, 2])),
            StreamEvent::Init { fields: Map::new() }
        );
    }

    #[test]
    fn test_unknown_passthrough() {
        let payload = json!({"content": "hi"});
        assert_eq!(
            StreamEvent::from_wire("message", payload.clone()),
            StreamEvent::Unknown { event: "message".to_string(), payload }
        );
    }

    #[test]
    fn test_serialized_tag() {
        let value = serde_json::to_value(StreamEvent::AnalysisDelta { text: "x".to_string() }).unwrap();
        assert_eq!(value, json!({"type": "analysis_delta", "text": "x"}));
    }
}
