use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::document::{parse_document, FeedDocument};

/// Sent on every feed request
pub const USER_AGENT: &str = "gator";

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a feed.
///
/// Any of these aborts the ingestion cycle for the feed; the feed stays
/// unmarked and is picked again on the next tick.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code; the body is never read
    #[error("HTTP error: {code} {status}")]
    HttpStatus { code: u16, status: String },
    /// Body could not be read as an RSS document
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// The cancellation token fired before the fetch completed
    #[error("Fetch cancelled")]
    Cancelled,
}

/// Build the shared HTTP client used for every feed request.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30)) // Close idle connections promptly
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Fetch `url` and parse it into a [`FeedDocument`].
///
/// Makes exactly one attempt. HTML entities in the channel title and
/// description and in every item's title and description are decoded
/// before returning.
///
/// # Errors
///
/// - [`FetchError::Cancelled`] if `cancel` fires first; the in-flight request is dropped
/// - [`FetchError::Transport`] on network failure
/// - [`FetchError::HttpStatus`] for any status outside 200..=299
/// - [`FetchError::ResponseTooLarge`] past 10MB
/// - [`FetchError::Parse`] for a body that is not an RSS document
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<FeedDocument, FetchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = fetch_and_parse(client, url) => result,
    }
}

async fn fetch_and_parse(client: &reqwest::Client, url: &str) -> Result<FeedDocument, FetchError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;

    let mut doc = parse_document(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;
    doc.unescape_entities();

    tracing::debug!(
        url = %url,
        bytes = bytes.len(),
        items = doc.items.len(),
        "Fetched feed"
    );
    Ok(doc)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
