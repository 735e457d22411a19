//! Server-Sent Events framing and parsing.
//!
//! The assistant backend speaks a small SSE dialect. Frames are separated by
//! a blank line, and each frame carries an optional event name plus one or
//! more data lines:
//!
//! ```text
//! event: delta
//! data: {"content": "Hel"}
//!
//! event: delta
//! data: {"content": "lo"}
//!
//! event: done
//! data: {"content": "Hello"}
//! ```
//!
//! Decoded text flows through [`FrameSplitter`], each completed [`Frame`] is
//! turned into a [`ParsedFrame`] by [`parse_frame`], and the data text becomes
//! JSON through [`decode_payload`].

use itertools::Itertools;
use nonempty::NonEmpty;
use serde_json::{json, Value};
use tracing::debug;

/// Separator between two frames.
pub const FRAME_SEPARATOR: &str = "\n\n";

/// Event name used when a frame has no `event:` line.
pub const DEFAULT_EVENT: &str = "message";

/// The lines of one blank-line delimited block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    /// Build a frame from its source text (without the trailing separator).
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The source text of the frame, lines rejoined with `\n`.
    pub fn text(&self) -> String {
        self.lines.iter().join("\n")
    }
}

/// Accumulates decoded text and cuts it into complete frames.
///
/// At most one incomplete frame is buffered between calls.
///
/// # Example
/// ```
/// use assist_stream::sse::FrameSplitter;
///
/// let mut splitter = FrameSplitter::new();
/// assert!(splitter.push("event: delta\n").is_empty());
///
/// let frames = splitter.push("data: {}\n\nevent: do");
/// assert_eq!(frames.len(), 1);
/// assert_eq!(splitter.buffered(), "event: do");
/// ```
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: String,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text received since the last separator.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Append `text` and return every frame it completes, in arrival order.
    pub fn push(&mut self, text: &str) -> Vec<Frame> {
        self.buffer.push_str(text);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].find(FRAME_SEPARATOR) {
            frames.push(Frame::from_text(&self.buffer[start..start + pos]));
            start += pos + FRAME_SEPARATOR.len();
        }
        self.buffer.drain(..start);

        frames
    }

    /// Drain the buffer at end of input.
    ///
    /// Returns the leftover text as a frame unless it is only whitespace.
    pub fn flush(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(Frame::from_text(&rest))
        }
    }
}

/// A frame reduced to its event name and data lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    event: String,
    data: NonEmpty<String>,
}

impl ParsedFrame {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// All data line values concatenated without a separator.
    pub fn data(&self) -> String {
        self.data.iter().map(String::as_str).collect()
    }

    /// The parsed payload, see [`decode_payload`].
    pub fn payload(&self) -> Value {
        decode_payload(&self.data())
    }
}

/// Extract the event name and data lines of a frame.
///
/// The event name starts as [`DEFAULT_EVENT`] for every frame; a later
/// `event:` line overwrites an earlier one. Lines that are neither `event:`
/// nor `data:` are ignored. A frame whose data lines are all blank, or that
/// has none, yields `None`.
///
/// # Example
/// ```
/// use assist_stream::sse::{parse_frame, Frame};
///
/// let frame = Frame::from_text("event: delta\ndata: {\"content\":\"hi\"}");
/// let parsed = parse_frame(&frame).unwrap();
/// assert_eq!(parsed.event(), "delta");
/// assert_eq!(parsed.data(), "{\"content\":\"hi\"}");
///
/// assert!(parse_frame(&Frame::from_text(": keep-alive")).is_none());
/// ```
pub fn parse_frame(frame: &Frame) -> Option<ParsedFrame> {
    let mut event = DEFAULT_EVENT.to_string();
    let mut data = Vec::new();

    for line in frame.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            let value = value.trim();
            if !value.is_empty() {
                data.push(value.to_string());
            }
        }
    }

    match NonEmpty::from_vec(data) {
        Some(data) => Some(ParsedFrame { event, data }),
        None => {
            debug!(event = %event, "dropping frame without data");
            None
        }
    }
}

/// Parse frame data as JSON, falling back to `{"error": <raw text>}`.
///
/// # Example
/// ```
/// use assist_stream::sse::decode_payload;
/// use serde_json::json;
///
/// assert_eq!(decode_payload("{\"content\":\"hi\"}"), json!({"content": "hi"}));
/// assert_eq!(decode_payload("not-json"), json!({"error": "not-json"}));
/// ```
pub fn decode_payload(text: &str) -> Value {
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "payload is not JSON, wrapping raw text");
            json!({ "error": text })
        }
    }
}
