//! Streams one assistant reply to stdout.
//!
//! Run with:
//! ```bash
//! export ASSIST_STREAM_BASE_URL="http://localhost:8000/api"
//! export ASSIST_STREAM_TOKEN="your-token"
//! RUST_LOG=assist_stream=debug cargo run --example stream_reply -- proposals/42/assistant "Summarise the scope"
//! ```
//!
//! Press Ctrl-C to cancel the stream.

use std::io::Write;

use assist_stream::{AbortController, AssistantClient, AssistantReply, StreamEvent, StreamingClient};
use futures::StreamExt;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let scope = args.next().unwrap_or_else(|| "assistant".to_string());
    let message = args.next().unwrap_or_else(|| "Hello!".to_string());

    let client = AssistantClient::from_env()?;
    let controller = AbortController::new();
    let signal = controller.signal();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            controller.abort();
        }
    });

    let mut events = client
        .send_message(&scope, json!({ "message": message }), Some(signal))
        .await?;

    let mut reply = AssistantReply::new();
    while let Some(event) = events.next().await {
        let event = event?;
        match &event {
            StreamEvent::Delta { text } => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
            StreamEvent::AnalysisDelta { text } => eprint!("{}", text),
            StreamEvent::Row { index, row, .. } => {
                println!("\n[row {:?}] {}", index, row.clone().unwrap_or_default());
            }
            StreamEvent::StreamError { message } => eprintln!("\nError in stream: {}", message),
            _ => {}
        }
        reply.apply(&event);
    }

    println!("\n\n=== Stream Complete ===");
    println!("completed: {}", reply.completed);
    if let Some(ids) = &reply.coverage_ids {
        println!("coverage ids: {}", ids.join(", "));
    }

    Ok(())
}
