//! # assist-stream - Assistant event-stream client
//!
//! Decodes the chunked `text/event-stream` responses of an AI assistant
//! backend into an ordered sequence of typed domain events: token-by-token
//! assistant text, an analysis side channel, streamed table rows, and
//! terminal completion or error signals.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Correct under arbitrary network chunking, including split UTF-8 characters
//! - Closed [`StreamEvent`] enum for exhaustive handling
//! - Pull-based consumption with cooperative cancellation
//!
//! ## Pipeline
//!
//! Each response body flows through a per-request [`StreamSession`]:
//!
//! 1. [`decoder::Utf8ChunkDecoder`] turns byte chunks into text
//! 2. [`sse::FrameSplitter`] cuts the text into blank-line delimited frames
//! 3. [`sse::parse_frame`] extracts the event name and data
//! 4. [`sse::decode_payload`] parses the data as JSON, wrapping raw text on failure
//! 5. [`StreamEvent::from_wire`] maps name and payload onto a domain event
//!
//! Malformed payloads and a truncated final frame are reported as events,
//! so only opening the stream (and a broken transport) can fail.
//!
//! ## Example
//! ```no_run
//! use assist_stream::{AbortController, AssistantClient, StreamEvent, StreamingClient};
//! use assist_stream::options::TransportOptions;
//! use futures::StreamExt;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AssistantClient::new(
//!         TransportOptions::new("https://app.example.com/api").with_bearer_token("token"),
//!     )?;
//!     let controller = AbortController::new();
//!
//!     let mut events = client
//!         .send_message(
//!             "proposals/42/assistant",
//!             json!({ "message": "Summarise the scope section" }),
//!             Some(controller.signal()),
//!         )
//!         .await?;
//!
//!     while let Some(event) = events.next().await {
//!         match event? {
//!             StreamEvent::Delta { text } => print!("{}", text),
//!             StreamEvent::Done { .. } => break,
//!             StreamEvent::StreamError { message } => eprintln!("{}", message),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod abort;
pub mod client;
pub mod decoder;
pub mod http;
pub mod model;
pub mod options;
pub mod reply;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use abort::{AbortController, AbortSignal};
pub use client::{AssistantClient, ClientError, Endpoint, StreamRequest, StreamingClient};
pub use model::StreamEvent;
pub use reply::{collect_reply, AssistantReply};
pub use stream::{EventStream, StreamSession};
