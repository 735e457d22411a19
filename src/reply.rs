//! Folding an event stream into the reply a UI renders.

use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::ClientError;
use crate::model::StreamEvent;

/// One streamed table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub index: Option<u64>,
    pub row: Option<Value>,
}

/// Everything received for one streamed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssistantReply {
    /// Assistant text: the deltas so far, or the full text once `done` arrives
    pub text: String,

    /// Text received on the analysis channel
    pub analysis: String,

    /// Rows ordered by index; rows without one keep arrival order at the end
    pub rows: Vec<TableRow>,

    pub total_rows: Option<u64>,

    pub init: Option<Map<String, Value>>,

    pub meta: Vec<Map<String, Value>>,

    pub coverage_ids: Option<Vec<String>>,

    pub anchor_terms_used: Option<Vec<String>>,

    /// Message of the last error event
    pub error: Option<String>,

    /// Whether a `done` event was received
    pub completed: bool,
}

impl AssistantReply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Delta { text } => self.text.push_str(text),
            StreamEvent::AnalysisDelta { text } => self.analysis.push_str(text),
            StreamEvent::Done {
                text,
                coverage_ids,
                anchor_terms_used,
            } => {
                if !text.is_empty() {
                    self.text.clone_from(text);
                }
                self.coverage_ids.clone_from(coverage_ids);
                self.anchor_terms_used.clone_from(anchor_terms_used);
                self.completed = true;
            }
            StreamEvent::StreamError { message } => self.error = Some(message.clone()),
            StreamEvent::Row {
                row,
                index,
                total_rows,
            } => {
                if total_rows.is_some() {
                    self.total_rows = *total_rows;
                }
                self.insert_row(TableRow {
                    index: *index,
                    row: row.clone(),
                });
            }
            StreamEvent::Init { fields } => self.init = Some(fields.clone()),
            StreamEvent::Meta { fields } => self.meta.push(fields.clone()),
            StreamEvent::Unknown { .. } => {}
        }
    }

    fn insert_row(&mut self, row: TableRow) {
        let Some(index) = row.index else {
            self.rows.push(row);
            return;
        };

        // A row with the same index replaces the earlier one.
        let pos = self
            .rows
            .iter()
            .position(|r| r.index.map_or(true, |i| i >= index))
            .unwrap_or(self.rows.len());

        if self.rows.get(pos).and_then(|r| r.index) == Some(index) {
            self.rows[pos] = row;
        } else {
            self.rows.insert(pos, row);
        }
    }
}

/// Drain `events` into an [`AssistantReply`].
///
/// Stops at the first transport error and returns it.
///
/// # Example
/// ```
/// use assist_stream::model::StreamEvent;
/// use assist_stream::reply::collect_reply;
/// use assist_stream::ClientError;
/// use futures::stream;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let events = stream::iter(vec![
///     Ok::<_, ClientError>(StreamEvent::Delta { text: "Hel".to_string() }),
///     Ok(StreamEvent::Delta { text: "lo".to_string() }),
/// ]);
///
/// let reply = collect_reply(events).await.unwrap();
/// assert_eq!(reply.text, "Hello");
/// assert!(!reply.completed);
/// # });
/// ```
pub async fn collect_reply<S>(events: S) -> Result<AssistantReply, ClientError>
where
    S: Stream<Item = Result<StreamEvent, ClientError>>,
{
    futures::pin_mut!(events);

    let mut reply = AssistantReply::new();
    while let Some(event) = events.next().await {
        reply.apply(&event?);
    }
    Ok(reply)
}
