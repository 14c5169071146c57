//! Route handlers for the gateway
//!
//! Handlers are organized by domain:
//! - [`news`] — News list, search, composite article and comment submission
//! - [`censorship`] — Banned-content check
//! - [`system`] — Health and OpenAPI

use crate::upstream::UpstreamResponse;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

mod censorship;
mod news;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use censorship::*;
pub use news::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /news
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNewsQuery {
    /// Page number; the latest 40 articles when absent
    pub page: Option<String>,
}

/// Query parameters for GET /news/filter
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterNewsQuery {
    /// Search string (required, non-empty)
    #[serde(default)]
    pub s: String,
}

/// Request body for POST /check and POST /news/:id/comment
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CommentBody {
    /// Comment text
    pub content: String,
    /// Author name
    #[serde(default)]
    pub author: Option<String>,
    /// Parent comment for replies
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Response for an approved POST /check
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CheckResponse {
    /// Always "ok"
    pub status: String,
}

/// Relay an upstream answer: status, content type and body unchanged
pub(crate) fn passthrough(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, upstream.body).into_response();

    let content_type = upstream
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok());
    match content_type {
        Some(value) => {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        None => {
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
    }

    response
}
