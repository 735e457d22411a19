//! Transport configuration for the assistant backend.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

pub const ENV_BASE_URL: &str = "ASSIST_STREAM_BASE_URL";
pub const ENV_TOKEN: &str = "ASSIST_STREAM_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "ASSIST_STREAM_TIMEOUT_SECS";
pub const ENV_PROXY: &str = "ASSIST_STREAM_PROXY";

/// A secret string type for sensitive data like bearer tokens.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// HTTP settings used to reach the streaming endpoints.
///
/// # Example
/// ```rust
/// use assist_stream::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new("https://app.example.com/api")
///     .with_bearer_token("token")
///     .with_timeout(Duration::from_secs(120))
///     .with_header("X-Workspace".to_string(), "acme".to_string());
///
/// assert_eq!(options.base_url, "https://app.example.com/api");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Base URL the endpoint paths are appended to
    pub base_url: String,

    /// Overall request timeout, body included
    pub timeout: Option<Duration>,

    pub connect_timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Sent as `Authorization: Bearer <token>`
    pub bearer_token: Option<SecretString>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read options from `ASSIST_STREAM_*` environment variables.
    ///
    /// `ASSIST_STREAM_BASE_URL` is required; the token, timeout (whole
    /// seconds) and proxy are optional.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ClientError::Config(format!("{} must be set", ENV_BASE_URL)))?;

        let mut options = Self::new(base_url);

        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            options = options.with_bearer_token(token);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} is not a whole number of seconds: {}", ENV_TIMEOUT_SECS, raw))
            })?;
            options = options.with_timeout(Duration::from_secs(secs));
        }

        if let Some(proxy) = lookup(ENV_PROXY).filter(|p| !p.is_empty()) {
            options = options.with_proxy(proxy);
        }

        Ok(options)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_secret_is_redacted() {
        let options = TransportOptions::new("http://localhost").with_bearer_token("hunter2");
        let debug = format!("{:?}", options);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_url_for() {
        let options = TransportOptions::new("http://localhost:8080/api/");
        assert_eq!(
            options.url_for("/proposals/1/assistant/message"),
            "http://localhost:8080/api/proposals/1/assistant/message"
        );
        assert_eq!(options.url_for("chat/message"), "http://localhost:8080/api/chat/message");
    }

    #[test]
    fn test_from_lookup() {
        let vars = [
            (ENV_BASE_URL, "http://localhost:3000"),
            (ENV_TOKEN, "abc"),
            (ENV_TIMEOUT_SECS, " 90 "),
        ];
        let options = TransportOptions::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(options.base_url, "http://localhost:3000");
        assert_eq!(options.bearer_token.unwrap().expose_secret(), "abc");
        assert_eq!(options.timeout, Some(Duration::from_secs(90)));
        assert!(options.proxy.is_none());
    }

    #[test]
    fn test_from_lookup_requires_base_url() {
        let result = TransportOptions::from_lookup(lookup(&[(ENV_TOKEN, "abc")]));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let vars = [(ENV_BASE_URL, "http://localhost"), (ENV_TIMEOUT_SECS, "soon")];
        let result = TransportOptions::from_lookup(lookup(&vars));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
