//! Bounded-timeout HTTP calls to the platform's upstream services
//!
//! Every call made through [`UpstreamClient`] carries the caller's correlation id as
//! the `request_id` query parameter and is bounded by a fixed per-call deadline.
//! Transport failures, non-success statuses and undecodable bodies are mapped onto
//! the three upstream error kinds of [`Error`].

use crate::correlation::RequestId;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Raw upstream answer, kept for pass-through proxying
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header, if the upstream sent one
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self, service: &'static str) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode {
            service,
            reason: e.to_string(),
        })
    }
}

/// HTTP client with a fixed per-call deadline
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    /// Create a client whose every call is bounded by `timeout`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("newsgate")
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, timeout })
    }

    /// The per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build `{base}/{segments...}?{params}&request_id={id}`
    ///
    /// Each segment is percent-encoded as a whole, so caller-supplied ids cannot add
    /// path levels or query parameters. `request_id` is always the last pair.
    ///
    /// # Errors
    /// - `Error::Config` if `base` is not an absolute URL
    /// - `Error::Validation` if a segment is empty, `.` or `..`
    pub fn endpoint(
        base: &str,
        segments: &[&str],
        params: &[(&str, &str)],
        request_id: &RequestId,
    ) -> Result<Url> {
        let invalid_base = |reason: String| Error::Config {
            message: format!("invalid upstream URL {}: {}", base, reason),
            key: Some("upstream".to_string()),
        };

        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::Validation(format!("invalid path segment {:?}", bad)));
        }

        let mut url = Url::parse(base).map_err(|e| invalid_base(e.to_string()))?;
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| invalid_base("cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments.iter().map(|s| urlencoding::encode(s)));

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        request_id.attach(&mut url);

        Ok(url)
    }

    /// GET a URL and return the raw response regardless of status
    pub async fn get(&self, service: &'static str, url: Url) -> Result<UpstreamResponse> {
        debug!(service, url = %url, "upstream GET");
        self.send(service, self.http.get(url)).await
    }

    /// POST a JSON body and return the raw response regardless of status
    pub async fn post_json(
        &self,
        service: &'static str,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<UpstreamResponse> {
        debug!(service, url = %url, "upstream POST");
        self.send(service, self.http.post(url).json(body)).await
    }

    /// GET a URL and decode a successful JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, service: &'static str, url: Url) -> Result<T> {
        let response = self.get(service, url).await?;
        if !response.is_success() {
            return Err(Error::UpstreamRejected {
                service,
                status: response.status,
            });
        }
        response.json(service)
    }

    async fn send(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse> {
        let unreachable = |e: reqwest::Error| Error::UpstreamUnreachable {
            service,
            reason: e.to_string(),
        };

        let response = request.send().await.map_err(unreachable)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(unreachable)?.to_vec();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
