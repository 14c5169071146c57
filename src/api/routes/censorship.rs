//! Censorship handler.

use super::CheckResponse;
use crate::api::AppState;
use crate::correlation::RequestId;
use crate::error::{ApiError, Error};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

/// POST /check - Approve or reject comment content
///
/// The body is a JSON object whose `content` key is matched case-insensitively. A body
/// without `content` (or `null`) is checked as empty text and approved.
#[utoipa::path(
    post,
    path = "/check",
    tag = "censorship",
    request_body = CommentBody,
    responses(
        (status = 200, description = "Content approved", body = CheckResponse),
        (status = 400, description = "Banned content or undecodable body", body = ApiError)
    )
)]
pub async fn check_comment(
    State(state): State<AppState>,
    request_id: RequestId,
    body: Bytes,
) -> Response {
    let content = match content_field(&body) {
        Ok(content) => content,
        Err(e) => return e.into_response(),
    };

    if let Some(word) = state.banned.find(&content) {
        info!(request_id = %request_id, word, "comment contains banned content");
        let error = ApiError::new("banned_content", "comment contains banned content");
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    }

    (
        StatusCode::OK,
        Json(CheckResponse {
            status: "ok".to_string(),
        }),
    )
        .into_response()
}

/// Pull the text to check out of a `/check` body
///
/// An exact `content` key wins over a case-insensitive match.
fn content_field(body: &[u8]) -> Result<String, Error> {
    let decode_error =
        |reason: String| Error::Validation(format!("failed to decode comment: {}", reason));

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| decode_error(e.to_string()))?;

    let object = match &value {
        serde_json::Value::Object(object) => object,
        serde_json::Value::Null => return Ok(String::new()),
        _ => return Err(decode_error("expected a JSON object".to_string())),
    };

    let field = object.get("content").or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content"))
            .map(|(_, v)| v)
    });

    match field {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(decode_error("content must be a string".to_string())),
    }
}
