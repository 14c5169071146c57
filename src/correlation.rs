//! Request correlation ids
//!
//! Every inbound gateway request gets a [`RequestId`]: the caller's `request_id`
//! query value when present, otherwise a fresh 6-character alphanumeric id. The id is
//! stored in the request extensions, recorded on a tracing span for the lifetime of
//! the request, and appended as `request_id` to every downstream URL built through
//! [`RequestId::attach`].

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use std::convert::Infallible;
use std::fmt;
use tracing::{Instrument, info};
use url::Url;

/// Query parameter carrying the correlation id on every hop
pub const REQUEST_ID_PARAM: &str = "request_id";

/// Response header echoing the correlation id back to the caller
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const ID_LEN: usize = 6;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Opaque correlation id scoped to one inbound request
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh alphanumeric id
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..ID_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Use the caller-supplied id if there is one, otherwise generate
    pub fn from_caller(supplied: Option<&str>) -> Self {
        match supplied.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::generate(),
        }
    }

    /// Resolve the id from a raw query string (`a=1&request_id=abc`)
    pub fn from_query(query: Option<&str>) -> Self {
        let supplied = query.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == REQUEST_ID_PARAM)
                .map(|(_, value)| value.into_owned())
        });
        Self::from_caller(supplied.as_deref())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append this id as the `request_id` query parameter of a downstream URL
    pub fn attach(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair(REQUEST_ID_PARAM, &self.0);
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Routes mounted without the middleware still resolve a stable id
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::from_query(parts.uri.query())))
    }
}

/// Middleware that resolves the correlation id and scopes the request under it
pub async fn propagate_request_id(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::from_query(req.uri().query());
    req.extensions_mut().insert(request_id.clone());

    info!(
        path = %req.uri().path(),
        request_id = %request_id,
        "request received"
    );

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = RequestId::generate();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_caller_supplied_id_wins() {
        assert_eq!(RequestId::from_caller(Some("abc123")).as_str(), "abc123");
    }

    #[test]
    fn test_blank_caller_id_is_replaced() {
        let id = RequestId::from_caller(Some("  "));
        assert_eq!(id.as_str().len(), ID_LEN);
    }

    #[test]
    fn test_from_query_finds_param_among_others() {
        let id = RequestId::from_query(Some("page=2&request_id=xyz789"));
        assert_eq!(id.as_str(), "xyz789");

        let generated = RequestId::from_query(Some("page=2"));
        assert_eq!(generated.as_str().len(), ID_LEN);

        let generated = RequestId::from_query(None);
        assert_eq!(generated.as_str().len(), ID_LEN);
    }

    #[test]
    fn test_attach_appends_to_existing_query() {
        let id = RequestId::from_caller(Some("abc123"));
        let mut url = Url::parse("http://news:8080/news?page=3").unwrap();
        id.attach(&mut url);

        assert_eq!(url.as_str(), "http://news:8080/news?page=3&request_id=abc123");
    }
}
