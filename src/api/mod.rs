//! Gateway HTTP server module
//!
//! Exposes the edge gateway routes over axum. Every request passes through the
//! correlation middleware, so handlers and the upstream calls they make share one
//! request id.

use crate::Result;
use crate::correlation;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the gateway router with all route definitions
///
/// # Routes
///
/// ## News
/// - `GET /news` - Latest news, or `?page=N`
/// - `GET /news/filter?s=` - Search news
/// - `GET /news/:id` - Article with its comments (concurrent fan-out)
/// - `POST /news/:id/comment` - Submit a comment (censorship, then storage)
///
/// ## Censorship
/// - `POST /check` - Banned-content check
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(state: AppState) -> Router {
    let api = &state.config.api;
    let cors = api.cors_enabled.then(|| build_cors_layer(&api.cors_origins));

    let router = Router::new()
        // News
        .route("/news", get(routes::list_news))
        .route("/news/filter", get(routes::filter_news))
        .route("/news/:id", get(routes::get_detailed_article))
        .route("/news/:id/comment", post(routes::add_comment))
        // Censorship
        .route("/check", post(routes::check_comment))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state);

    // The last layer applied is the outermost: Trace → Correlation → Handler
    let router = router
        .layer(middleware::from_fn(correlation::propagate_request_id))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the gateway on the configured bind address
///
/// Runs until `cancel` fires, then stops accepting connections and lets in-flight
/// requests finish.
pub async fn start_api_server(state: AppState, cancel: CancellationToken) -> Result<()> {
    let bind_address = state.config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, state, cancel).await
}

/// Serve the gateway on an already bound listener until `cancel` fires
pub async fn serve(listener: TcpListener, state: AppState, cancel: CancellationToken) -> Result<()> {
    let app = create_router(state);

    if let Ok(address) = listener.local_addr() {
        tracing::info!(address = %address, "API server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
