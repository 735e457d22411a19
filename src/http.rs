//! HTTP client construction for the streaming endpoints.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Media type requested from the streaming endpoints.
pub const EVENT_STREAM: &str = "text/event-stream";

/// Build a configured HTTP client from transport options.
///
/// This applies timeouts and the proxy. An unparsable proxy URL is a
/// configuration error.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(timeout) = transport_options.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Start a streaming POST to `url` with the standard headers.
pub fn stream_request(client: &Client, url: &str, transport_options: &TransportOptions) -> RequestBuilder {
    let mut request = client
        .post(url)
        .header(ACCEPT, EVENT_STREAM)
        .header(CONTENT_TYPE, "application/json");

    if let Some(token) = &transport_options.bearer_token {
        request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
    }

    add_extra_headers(request, &transport_options.extra_headers)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}
