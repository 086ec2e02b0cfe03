//! [`Transport`] over HTTP using `reqwest`.

use std::time::Duration;

use lifesync_core::config::ServerConfig;
use lifesync_core::request::SyncError;
use tracing::debug;

use crate::transport::Transport;

/// HTTP transport rooted at a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` with no request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: trim_base(base_url.into()),
        }
    }

    /// Create a transport from server configuration.
    ///
    /// A non-zero `request_timeout_ms` bounds each request; zero leaves
    /// requests unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the underlying client cannot be
    /// built (for example, no TLS backend is available).
    pub fn from_config(config: &ServerConfig) -> Result<Self, SyncError> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: trim_base(config.base_url.clone()),
        })
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<serde_json::Value, SyncError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("GET {url} failed: {e}")))?;
        read_body(&url, response).await
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, SyncError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("POST {url} failed: {e}")))?;
        read_body(&url, response).await
    }
}

/// Check the status and decode the body as JSON.
async fn read_body(url: &str, response: reqwest::Response) -> Result<serde_json::Value, SyncError> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(SyncError::Transport(format!(
            "{url} returned {status}: {error_body}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SyncError::Transport(format!("reading {url} failed: {e}")))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::Decode(format!("{url} returned invalid JSON: {e}")))
}

fn trim_base(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        let _ = base_url.pop();
    }
    base_url
}
