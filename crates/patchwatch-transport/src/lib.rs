// # HTTP Transport
//
// Shared HTTP fetch layer for the platform adapters.
//
// ## Purpose
//
// Every platform endpoint is a plain GET returning JSON (or, for the
// Battle.net CDN config blobs, raw text). This crate owns the one reqwest
// client, the request timeout, and the single-retry policy so the adapters
// only deal in parsed bodies.
//
// ## Retry policy
//
// Exactly one retry, after a fixed backoff, and only for transient failures
// (connect/timeout errors, HTTP 5xx, HTTP 429). Anything else fails
// immediately. Adapters that want to treat a failure as soft (a cycle skip
// rather than an error) decide that above this layer.

use std::time::Duration;

use thiserror::Error;

/// Request timeout applied to every GET.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fixed pause before the single retry.
const DEFAULT_RETRY_BACKOFF_SECS: u64 = 10;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("patchwatch/", env!("CARGO_PKG_VERSION"));

/// Errors from the transport layer
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (connect failure, timeout)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body could not be read
    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Body { .. } => false,
        }
    }
}

impl From<FetchError> for patchwatch_core::Error {
    fn from(e: FetchError) -> Self {
        patchwatch_core::Error::transport(e.to_string())
    }
}

/// A fetched response body
///
/// Endpoints normally return JSON; the Battle.net CDN config blobs are
/// key-value text. The body is parsed as JSON when possible and handed back
/// verbatim otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(text),
        }
    }

    /// The parsed JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    /// The raw text, if the body was not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Json(_) => None,
            Body::Text(text) => Some(text),
        }
    }
}

/// Shared HTTP client with the retry policy baked in
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    retry_backoff: Duration,
}

impl Transport {
    /// Create a transport with the default timeout and retry backoff.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_backoff(Duration::from_secs(DEFAULT_RETRY_BACKOFF_SECS))
    }

    /// Create a transport with a custom retry backoff.
    pub fn with_backoff(retry_backoff: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            retry_backoff,
        })
    }

    /// GET a URL, retrying once on transient failure.
    pub async fn get_body(&self, url: &str) -> Result<Body, FetchError> {
        with_one_retry(self.retry_backoff, || self.get_once(url)).await
    }

    /// GET a URL, requiring a JSON body.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        match self.get_body(url).await? {
            Body::Json(value) => Ok(value),
            Body::Text(_) => Err(FetchError::Body {
                url: url.to_string(),
                message: "expected JSON".to_string(),
            }),
        }
    }

    /// GET a URL, returning the body as text regardless of content type.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        match self.get_body(url).await? {
            Body::Json(value) => Ok(value.to_string()),
            Body::Text(text) => Ok(text),
        }
    }

    /// POST a JSON payload.
    ///
    /// Never retried: the caller cannot tell a lost response from a lost
    /// request, and a duplicate delivery is worse than a missed one.
    pub async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), FetchError> {
        tracing::trace!("POST {}", url);

        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    async fn get_once(&self, url: &str) -> Result<Body, FetchError> {
        tracing::trace!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Body::parse(text))
    }
}

/// Run `attempt`, and on a transient failure run it exactly once more after
/// `backoff`.
async fn with_one_retry<T, F, Fut>(backoff: Duration, mut attempt: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    match attempt().await {
        Ok(value) => Ok(value),
        Err(e) if e.is_transient() => {
            tracing::warn!("transient fetch failure, retrying in {:?}: {}", backoff, e);
            tokio::time::sleep(backoff).await;
            attempt().await
        }
        Err(e) => Err(e),
    }
}
