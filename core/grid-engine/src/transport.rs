//! FILENAME: core/grid-engine/src/transport.rs
//! PURPOSE: Transport abstraction over "fetch/post a JSON resource".
//! CONTEXT: The controller talks to the remote collection exclusively
//! through the `Transport` trait, so tests script responses in memory and
//! hosts can wrap whatever client they already have. `HttpTransport` is
//! the shipped implementation over `reqwest`.

use serde_json::Value;

/// The two write verbs of the save protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Create (no id in the payload).
    Post,
    /// Update (`baseUrl/id`).
    Put,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// A failed fetch or save.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    /// HTTP status, when the server answered at all.
    pub status: Option<u16>,

    /// Human-readable failure description.
    pub message: String,

    /// The response body, when one was readable. A failed save may name
    /// the offending column here as `{"field": "<attribute>"}`.
    pub body: Option<Value>,
}

impl TransportError {
    /// The server-named offending field of a failed save, if reported.
    pub fn field(&self) -> Option<String> {
        self.body
            .as_ref()
            .and_then(|body| body.get("field"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "transport error (status {}): {}", status, self.message),
            None => write!(f, "transport error: {}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Fetches and posts JSON resources by URL.
///
/// Futures are not required to be `Send`; controllers run wherever the
/// host's executor puts them.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// GETs a JSON resource.
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError>;

    /// POSTs/PUTs a JSON body, returning the response body.
    async fn send_json(
        &self,
        method: Method,
        url: &str,
        body: &Value,
    ) -> Result<Value, TransportError>;
}

// ============================================================================
// HTTP TRANSPORT (reqwest)
// ============================================================================

/// The shipped HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport::default()
    }

    /// Wraps an existing client (connection pools, headers, timeouts are
    /// the host's business).
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, TransportError> {
        let status = response.status();
        if status.is_success() {
            response.json::<Value>().await.map_err(|err| TransportError {
                status: Some(status.as_u16()),
                message: format!("response body is not valid JSON: {}", err),
                body: None,
            })
        } else {
            // Keep whatever body the server sent; failed saves report the
            // offending field there.
            let body = response.json::<Value>().await.ok();
            Err(TransportError {
                status: Some(status.as_u16()),
                message: format!("server responded with status {}", status.as_u16()),
                body,
            })
        }
    }

    fn connect_error(err: reqwest::Error) -> TransportError {
        TransportError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            body: None,
        }
    }
}

impl Transport for HttpTransport {
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::connect_error)?;
        Self::read_json(response).await
    }

    async fn send_json(
        &self,
        method: Method,
        url: &str,
        body: &Value,
    ) -> Result<Value, TransportError> {
        let request = match method {
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
        };
        let response = request
            .json(body)
            .send()
            .await
            .map_err(Self::connect_error)?;
        Self::read_json(response).await
    }
}
