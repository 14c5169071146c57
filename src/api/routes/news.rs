//! News handlers: list, search, composite article, comment submission.

use super::{FilterNewsQuery, ListNewsQuery, passthrough};
use crate::api::AppState;
use crate::correlation::RequestId;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};

/// GET /news - Latest news, or one page of it
#[utoipa::path(
    get,
    path = "/news",
    tag = "news",
    params(ListNewsQuery),
    responses(
        (status = 200, description = "News list as returned by the article service"),
        (status = 500, description = "Article service unavailable", body = crate::error::ApiError)
    )
)]
pub async fn list_news(
    State(state): State<AppState>,
    request_id: RequestId,
    Query(query): Query<ListNewsQuery>,
) -> Response {
    match state
        .orchestrator
        .list_news(query.page.as_deref(), &request_id)
        .await
    {
        Ok(upstream) => passthrough(upstream),
        Err(e) => e.into_response(),
    }
}

/// GET /news/filter - Search news by title
#[utoipa::path(
    get,
    path = "/news/filter",
    tag = "news",
    params(FilterNewsQuery),
    responses(
        (status = 200, description = "Matching news as returned by the article service"),
        (status = 400, description = "Missing search query", body = crate::error::ApiError),
        (status = 500, description = "Article service unavailable", body = crate::error::ApiError)
    )
)]
pub async fn filter_news(
    State(state): State<AppState>,
    request_id: RequestId,
    Query(query): Query<FilterNewsQuery>,
) -> Response {
    match state.orchestrator.filter_news(&query.s, &request_id).await {
        Ok(upstream) => passthrough(upstream),
        Err(e) => e.into_response(),
    }
}

/// GET /news/:id - Article together with its comments
#[utoipa::path(
    get,
    path = "/news/{id}",
    tag = "news",
    params(
        ("id" = String, Path, description = "Article ID")
    ),
    responses(
        (status = 200, description = "Article and comments", body = crate::types::DetailedArticle),
        (status = 500, description = "Either upstream failed", body = crate::error::ApiError)
    )
)]
pub async fn get_detailed_article(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(id): Path<String>,
) -> Response {
    match state.orchestrator.detailed_article(&id, &request_id).await {
        Ok(article) => Json(article).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /news/:id/comment - Submit a comment through censorship
#[utoipa::path(
    post,
    path = "/news/{id}/comment",
    tag = "news",
    params(
        ("id" = String, Path, description = "Article ID")
    ),
    request_body = super::CommentBody,
    responses(
        (status = 201, description = "Stored; status and body come from the comments service"),
        (status = 400, description = "Invalid body or rejected by censorship", body = crate::error::ApiError),
        (status = 500, description = "An upstream failed", body = crate::error::ApiError)
    )
)]
pub async fn add_comment(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    match state.orchestrator.add_comment(&id, &body, &request_id).await {
        Ok(upstream) => passthrough(upstream),
        Err(e) => e.into_response(),
    }
}
