//! Pull-based consumption of an assistant event stream.
//!
//! A [`StreamSession`] owns one response body together with its decoding
//! state. Each call to [`StreamSession::next_event`] returns the next
//! [`StreamEvent`] in arrival order, reading from the network only once
//! every event decoded from the previous chunk has been handed out.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, trace, warn};

use crate::abort::AbortSignal;
use crate::client::ClientError;
use crate::decoder::Utf8ChunkDecoder;
use crate::model::StreamEvent;
use crate::sse::{parse_frame, FrameSplitter};

/// Boxed event stream returned by streaming clients.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClientError>> + Send>>;

/// Outcome of waiting for the next body chunk.
enum Read<T> {
    Chunk(Option<T>),
    Cancelled,
}

/// Per-request decoding state bound to one response body.
///
/// # Example
/// ```
/// use assist_stream::model::StreamEvent;
/// use assist_stream::stream::StreamSession;
/// use assist_stream::ClientError;
/// use bytes::Bytes;
/// use futures::stream;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let body = stream::iter(vec![
///     Ok::<_, ClientError>(Bytes::from("event: delta\ndata: {\"content\":\"Hi\"}\n")),
///     Ok(Bytes::from("\n")),
/// ]);
/// let mut session = StreamSession::new(body, None);
///
/// let event = session.next_event().await.unwrap();
/// assert_eq!(event, Some(StreamEvent::Delta { text: "Hi".to_string() }));
/// assert_eq!(session.next_event().await.unwrap(), None);
/// # });
/// ```
pub struct StreamSession<S> {
    body: Option<Pin<Box<S>>>,
    abort: Option<AbortSignal>,
    decoder: Utf8ChunkDecoder,
    splitter: FrameSplitter,
    pending: VecDeque<StreamEvent>,
}

impl<S, E> StreamSession<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ClientError>,
{
    pub fn new(body: S, abort: Option<AbortSignal>) -> Self {
        Self {
            body: Some(Box::pin(body)),
            abort,
            decoder: Utf8ChunkDecoder::new(),
            splitter: FrameSplitter::new(),
            pending: VecDeque::new(),
        }
    }

    /// Pull the next event.
    ///
    /// Returns `Ok(None)` once the body is exhausted or the abort signal has
    /// fired. A transport failure is returned once as `Err`, after which the
    /// session is finished. A finished session no longer holds the body.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, ClientError> {
        loop {
            if self.is_cancelled() {
                return Ok(None);
            }
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            let Some(body) = self.body.as_mut() else {
                return Ok(None);
            };

            let read = match self.abort.as_mut() {
                Some(abort) => tokio::select! {
                    biased;
                    _ = abort.aborted() => Read::Cancelled,
                    chunk = body.next() => Read::Chunk(chunk),
                },
                None => Read::Chunk(body.next().await),
            };

            match read {
                Read::Cancelled => {
                    debug!("stream aborted while waiting for data");
                    self.cancel();
                    return Ok(None);
                }
                Read::Chunk(Some(Ok(chunk))) => {
                    trace!(bytes = chunk.len(), "received chunk");
                    let text = self.decoder.decode(&chunk, false);
                    self.absorb(&text);
                }
                Read::Chunk(Some(Err(e))) => {
                    self.cancel();
                    return Err(e.into());
                }
                Read::Chunk(None) => {
                    let text = self.decoder.decode(&[], true);
                    self.absorb(&text);
                    if let Some(rest) = self.splitter.flush() {
                        warn!(text = %rest.text(), "stream ended inside a frame");
                        self.pending.push_back(StreamEvent::StreamError {
                            message: format!(
                                "Stream ended with an incomplete event: {}",
                                rest.text()
                            ),
                        });
                    }
                    self.body = None;
                }
            }
        }
    }

    /// Turn the session into a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = Result<StreamEvent, ClientError>> + Send
    where
        S: Send + 'static,
        E: Send + 'static,
    {
        stream::unfold(self, |mut session| async move {
            match session.next_event().await {
                Ok(Some(event)) => Some((Ok(event), session)),
                Ok(None) => None,
                Err(e) => Some((Err(e), session)),
            }
        })
    }

    fn is_cancelled(&mut self) -> bool {
        let cancelled = self.abort.as_ref().is_some_and(AbortSignal::is_aborted);
        if cancelled && self.body.is_some() {
            debug!("stream aborted");
            self.cancel();
        }
        cancelled
    }

    /// Drop the body, releasing the connection, and any undelivered events.
    fn cancel(&mut self) {
        self.body = None;
        self.pending.clear();
    }

    fn absorb(&mut self, text: &str) {
        for frame in self.splitter.push(text) {
            if let Some(parsed) = parse_frame(&frame) {
                let event = StreamEvent::from_wire(parsed.event(), parsed.payload());
                self.pending.push_back(event);
            }
        }
    }
}

/// Extension trait turning a `reqwest::Response` into domain events.
///
/// # Example
/// ```ignore
/// use assist_stream::stream::EventStreamExt;
///
/// let response = http.post(url).send().await?;
/// let mut events = Box::pin(response.events(None));
/// while let Some(event) = events.next().await {
///     println!("{:?}", event?);
/// }
/// ```
pub trait EventStreamExt {
    fn events(
        self,
        abort: Option<AbortSignal>,
    ) -> impl Stream<Item = Result<StreamEvent, ClientError>> + Send;
}

impl EventStreamExt for reqwest::Response {
    fn events(
        self,
        abort: Option<AbortSignal>,
    ) -> impl Stream<Item = Result<StreamEvent, ClientError>> + Send {
        StreamSession::new(self.bytes_stream(), abort).into_stream()
    }
}
