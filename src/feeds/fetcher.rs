//! HTTP retrieval of feed documents

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error response body carried in the error
pub const MAX_ERROR_BODY: usize = 2048;

/// Fetches raw feed documents with a fixed per-request timeout
#[derive(Clone, Debug)]
pub struct FeedFetcher {
    http: reqwest::Client,
}

impl FeedFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("newsgate feed reader")
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Fetch the body of `url` as text
    ///
    /// # Errors
    /// Returns `Error::FeedFetch` on transport failure, timeout or a non-2xx status.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching feed");

        let response = self.http.get(url).send().await.map_err(|e| Error::FeedFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let snippet = String::from_utf8_lossy(&body[..body.len().min(MAX_ERROR_BODY)]);
            return Err(Error::FeedFetch {
                url: url.to_string(),
                reason: format!("HTTP {}: {}", status.as_u16(), snippet.trim()),
            });
        }

        response.text().await.map_err(|e| Error::FeedFetch {
            url: url.to_string(),
            reason: format!("failed to read body: {}", e),
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .mount(&server)
            .await;

        let fetcher = FeedFetcher::new(Duration::from_secs(5)).unwrap();
        let body = fetcher
            .fetch(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<rss/>");
    }

    #[tokio::test]
    async fn test_non_success_status_carries_truncated_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(5000)))
            .mount(&server)
            .await;

        let fetcher = FeedFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap_err();

        match err {
            Error::FeedFetch { reason, .. } => {
                assert!(reason.starts_with("HTTP 503: "));
                assert_eq!(reason.len(), "HTTP 503: ".len() + MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_feed_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = FeedFetcher::new(Duration::from_millis(100)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::FeedFetch { .. }));
    }
}
