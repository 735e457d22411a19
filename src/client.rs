//! Streaming client trait, its reqwest implementation, and error types.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::abort::AbortSignal;
use crate::http::{build_http_client, stream_request};
use crate::options::TransportOptions;
use crate::stream::{EventStream, EventStreamExt};

/// Errors that can occur during client operations.
///
/// Only failures that prevent an event stream from existing, or that break
/// the transport mid-body, are errors. Backend error events and malformed
/// payloads are delivered as [`StreamEvent`](crate::model::StreamEvent)s.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The endpoint answered with a non-success status; `message` is the body.
    #[error("{message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Streaming routes exposed by the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Message,
    WebSearch,
    GenerateSections,
    GenerateCapabilityMatrix,
    /// Any other route, relative to the scope.
    Custom(String),
}

impl Endpoint {
    pub fn route(&self) -> &str {
        match self {
            Endpoint::Message => "message",
            Endpoint::WebSearch => "websearch",
            Endpoint::GenerateSections => "sections/generate",
            Endpoint::GenerateCapabilityMatrix => "capability-matrix/generate",
            Endpoint::Custom(route) => route,
        }
    }

    /// Join a resource scope such as `proposals/42/assistant` with the route.
    ///
    /// # Example
    /// ```
    /// use assist_stream::client::Endpoint;
    ///
    /// assert_eq!(
    ///     Endpoint::GenerateSections.path("/proposals/42/"),
    ///     "proposals/42/sections/generate"
    /// );
    /// assert_eq!(Endpoint::Message.path(""), "message");
    /// ```
    pub fn path(&self, scope: &str) -> String {
        let scope = scope.trim_matches('/');
        let route = self.route().trim_start_matches('/');
        if scope.is_empty() {
            route.to_string()
        } else {
            format!("{}/{}", scope, route)
        }
    }
}

/// One streaming POST: relative path, JSON body, optional abort signal.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub path: String,
    pub body: Value,
    pub abort: Option<AbortSignal>,
}

impl StreamRequest {
    pub fn new(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            body,
            abort: None,
        }
    }

    pub fn to_endpoint(scope: &str, endpoint: &Endpoint, body: Value) -> Self {
        Self::new(endpoint.path(scope), body)
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = Some(abort);
        self
    }
}

/// Client trait for the streaming assistant endpoints.
///
/// Implementors only provide [`open_stream`](StreamingClient::open_stream);
/// the per-route helpers are built on top of it. The returned stream yields
/// events in arrival order and ends quietly when the request's abort signal
/// fires.
///
/// # Example
/// ```rust,ignore
/// let client = AssistantClient::new(TransportOptions::from_env()?)?;
/// let mut events = client
///     .send_message("proposals/42/assistant", json!({"message": "Summarise"}), None)
///     .await?;
///
/// while let Some(event) = events.next().await {
///     match event? {
///         StreamEvent::Delta { text } => print!("{}", text),
///         StreamEvent::Done { .. } => break,
///         _ => {}
///     }
/// }
/// ```
#[async_trait]
pub trait StreamingClient: Send + Sync {
    /// Send the request and return its event stream.
    ///
    /// Fails before producing any event when the connection cannot be made,
    /// the status is not a success, or the abort signal fires first.
    async fn open_stream(&self, request: StreamRequest) -> Result<EventStream, ClientError>;

    async fn send_message(
        &self,
        scope: &str,
        body: Value,
        abort: Option<AbortSignal>,
    ) -> Result<EventStream, ClientError> {
        self.open_stream(request_for(scope, Endpoint::Message, body, abort)).await
    }

    async fn web_search(
        &self,
        scope: &str,
        body: Value,
        abort: Option<AbortSignal>,
    ) -> Result<EventStream, ClientError> {
        self.open_stream(request_for(scope, Endpoint::WebSearch, body, abort)).await
    }

    async fn generate_sections(
        &self,
        scope: &str,
        body: Value,
        abort: Option<AbortSignal>,
    ) -> Result<EventStream, ClientError> {
        self.open_stream(request_for(scope, Endpoint::GenerateSections, body, abort))
            .await
    }

    async fn generate_capability_matrix(
        &self,
        scope: &str,
        body: Value,
        abort: Option<AbortSignal>,
    ) -> Result<EventStream, ClientError> {
        self.open_stream(request_for(scope, Endpoint::GenerateCapabilityMatrix, body, abort))
            .await
    }
}

fn request_for(
    scope: &str,
    endpoint: Endpoint,
    body: Value,
    abort: Option<AbortSignal>,
) -> StreamRequest {
    StreamRequest {
        abort,
        ..StreamRequest::to_endpoint(scope, &endpoint, body)
    }
}

/// `reqwest` based client for the assistant backend.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    transport_options: TransportOptions,
}

impl AssistantClient {
    pub fn new(transport_options: TransportOptions) -> Result<Self, ClientError> {
        if transport_options.base_url.trim().is_empty() {
            return Err(ClientError::Config("base URL is required".to_string()));
        }

        Ok(Self {
            http: build_http_client(&transport_options)?,
            transport_options,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(TransportOptions::from_env()?)
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    /// Turn a non-success response into a [`ClientError::Status`].
    async fn status_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            format!("Request failed with status {}", status)
        } else {
            body
        };
        warn!(%status, "streaming request rejected");
        ClientError::Status { status, message }
    }
}

#[async_trait]
impl StreamingClient for AssistantClient {
    async fn open_stream(&self, request: StreamRequest) -> Result<EventStream, ClientError> {
        let StreamRequest { path, body, abort } = request;
        let url = self.transport_options.url_for(&path);

        if abort.as_ref().is_some_and(AbortSignal::is_aborted) {
            return Err(ClientError::StreamCancelled);
        }

        let send = stream_request(&self.http, &url, &self.transport_options)
            .json(&body)
            .send();

        let response = match abort.clone() {
            Some(mut signal) => tokio::select! {
                biased;
                _ = signal.aborted() => return Err(ClientError::StreamCancelled),
                response = send => response?,
            },
            None => send.await?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(response).await);
        }

        info!(%url, %status, "event stream opened");
        let events: EventStream = Box::pin(response.events(abort));
        Ok(events)
    }
}
