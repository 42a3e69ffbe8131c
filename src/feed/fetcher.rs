use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::feed::document::{parse_document, FeedDocument};

/// Upper bound on a single request, connect through last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
pub const USER_AGENT: &str = "gator";

/// Errors that can occur while fetching and decoding one feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No URL to request
    #[error("Invalid feed URL: {0:?}")]
    InvalidUrl(String),
    /// Network-level error (DNS, connection, TLS, body stream)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// Request exceeded the client timeout
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),
    /// HTTP response with 4xx/5xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded [`MAX_FEED_SIZE`]
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not a decodable feed document
    #[error("Parse error: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Fetch
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(err)
        }
    }
}

/// HTTP client for RSS documents.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    /// Client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::Network)?;
        Ok(Self { client })
    }

    /// Fetches `url` and decodes it as an RSS document.
    ///
    /// Single attempt, no retries: the scheduler simply comes back to the
    /// feed on a later rotation.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] - `url` is empty
    /// - [`FetchError::Network`] - connection, DNS or TLS failure
    /// - [`FetchError::Timeout`] - the client timeout elapsed
    /// - [`FetchError::HttpStatus`] - 4xx or 5xx response
    /// - [`FetchError::ResponseTooLarge`] - body over 10MB
    /// - [`FetchError::Parse`] - body is not an RSS, Atom or JSON feed
    pub async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FetchError::InvalidUrl(url.to_owned()));
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;

        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched feed body");
        Ok(parse_document(&bytes)?)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: trust an oversized Content-Length without reading the body
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Feed</title>
    <item><title>Test</title><link>https://example.com/1</link></item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::new().unwrap();
        let doc = fetcher
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(doc.channel.title, "Test Feed");
        assert_eq!(doc.channel.items.len(), 1);
        assert_eq!(doc.channel.items[0].link, "https://example.com/1");
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::new().unwrap();
        let result = fetcher.fetch(&mock_server.uri()).await;
        assert!(result.is_ok(), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::new().unwrap();
        match fetcher.fetch(&mock_server.uri()).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::new().unwrap();
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)));
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>Not a feed</body></html>"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::new().unwrap();
        match fetcher.fetch(&mock_server.uri()).await {
            Err(FetchError::Parse(_)) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::with_timeout(Duration::from_millis(100)).unwrap();
        match fetcher.fetch(&mock_server.uri()).await {
            Err(FetchError::Timeout(_)) => {}
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b' '; MAX_FEED_SIZE + 1]))
            .mount(&mock_server)
            .await;

        let fetcher = FeedFetcher::new().unwrap();
        match fetcher.fetch(&mock_server.uri()).await {
            Err(FetchError::ResponseTooLarge) => {}
            other => panic!("Expected ResponseTooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let fetcher = FeedFetcher::new().unwrap();
        assert!(matches!(
            fetcher.fetch("").await,
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            fetcher.fetch("   ").await,
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let fetcher = FeedFetcher::with_timeout(Duration::from_secs(2)).unwrap();
        // Port 9 on loopback: nothing listens, connection is refused
        match fetcher.fetch("http://127.0.0.1:9/feed").await {
            Err(FetchError::Network(_)) | Err(FetchError::Timeout(_)) => {}
            other => panic!("Expected Network error, got {:?}", other),
        }
    }
}
