use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use super::image::ImageExtractor;
use super::parser::parse_feed;
use super::types::{NormalizedItem, Source};

/// Default per-request timeout for upstream feeds.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Default cap on an upstream response body.
pub const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching one source.
///
/// None of these reach the HTTP caller; they are logged and the source
/// contributes zero items.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The fetch task panicked or was cancelled
    #[error("Fetch task failed: {0}")]
    TaskFailed(String),
}

/// Knobs for upstream fetches.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// `None` leaves the HTTP client's own default in place.
    pub timeout: Option<Duration>,
    pub max_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_FETCH_TIMEOUT),
            max_bytes: DEFAULT_MAX_FEED_SIZE,
        }
    }
}

/// Outcome of fetching a single source.
#[derive(Debug)]
pub struct FetchResult {
    /// Name of the source that was fetched
    pub source: String,
    /// Parsed items, or the error that occurred
    pub result: Result<Vec<NormalizedItem>, FetchError>,
}

impl FetchResult {
    /// The items on success. A failure is logged and yields an empty list.
    pub fn into_items(self) -> Vec<NormalizedItem> {
        match self.result {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(source = %self.source, error = %e, "Feed fetch failed, skipping source");
                Vec::new()
            }
        }
    }
}

/// Fetches one source and returns its items, or an empty list on any
/// failure. The failure is logged and never propagated.
pub async fn fetch_items(
    client: &reqwest::Client,
    source: &Source,
    options: FetchOptions,
    extractor: &dyn ImageExtractor,
) -> Vec<NormalizedItem> {
    fetch_source(client, source, options, extractor)
        .await
        .into_items()
}

/// Fetches and parses one source, returning a tagged result.
pub async fn fetch_source(
    client: &reqwest::Client,
    source: &Source,
    options: FetchOptions,
    extractor: &dyn ImageExtractor,
) -> FetchResult {
    let result = fetch_one(client, source, options, extractor).await;
    FetchResult {
        source: source.name.clone(),
        result,
    }
}

async fn fetch_one(
    client: &reqwest::Client,
    source: &Source,
    options: FetchOptions,
    extractor: &dyn ImageExtractor,
) -> Result<Vec<NormalizedItem>, FetchError> {
    let request = download(client, &source.url, options.max_bytes);
    let bytes = match options.timeout {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_| FetchError::Timeout)??,
        None => request.await?,
    };

    let items = parse_feed(&bytes, &source.name, extractor)
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    tracing::debug!(source = %source.name, items = items.len(), "Fetched feed");
    Ok(items)
}

async fn download(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await?;

    // No retries: a failing source simply sits this round out.
    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, max_bytes).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // A dropped connection can end the stream early.
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
