//! OpenAPI documentation and schema generation
//!
//! Describes the gateway routes using utoipa for compile-time spec generation. The
//! spec is served at `/openapi.json`.

use utoipa::OpenApi;

/// OpenAPI documentation for the newsgate gateway
#[derive(OpenApi)]
#[openapi(
    info(
        title = "newsgate gateway API",
        version = "0.1.0",
        description = "Edge gateway for the news platform: news proxying, composite article view and moderated comment submission",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::api::routes::list_news,
        crate::api::routes::filter_news,
        crate::api::routes::get_detailed_article,
        crate::api::routes::add_comment,
        crate::api::routes::check_comment,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::types::ArticleSummary,
            crate::types::CommentView,
            crate::types::DetailedArticle,
            crate::types::Visibility,
            crate::api::routes::ListNewsQuery,
            crate::api::routes::FilterNewsQuery,
            crate::api::routes::CommentBody,
            crate::api::routes::CheckResponse,
            crate::error::ApiError,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "news", description = "News proxying and the composite article view"),
        (name = "censorship", description = "Banned-content check"),
        (name = "system", description = "Health and documentation")
    )
)]
pub struct ApiDoc;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_gateway_paths() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();
        let paths = json["paths"].as_object().unwrap();

        for path in ["/news", "/news/filter", "/news/{id}", "/news/{id}/comment", "/check", "/health"] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }
}
