use super::*;
use crate::config::{Config, UpstreamConfig};
use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;


/// Mock article, comments and censorship services
struct Upstreams {
    news: MockServer,
    comments: MockServer,
    censorship: MockServer,
}

impl Upstreams {
    async fn start() -> Self {
        Self {
            news: MockServer::start().await,
            comments: MockServer::start().await,
            censorship: MockServer::start().await,
        }
    }

    fn config(&self) -> Config {
        Config {
            upstream: UpstreamConfig {
                news_url: self.news.uri(),
                comments_url: self.comments.uri(),
                censorship_url: self.censorship.uri(),
                timeout: Duration::from_secs(2),
            },
            ..Config::default()
        }
    }

    fn router(&self) -> Router {
        create_router(AppState::from_config(Arc::new(self.config())).unwrap())
    }
}

/// Router whose upstreams are never reached
fn offline_router() -> Router {
    let config = Config {
        upstream: UpstreamConfig {
            news_url: "http://127.0.0.1:9".to_string(),
            comments_url: "http://127.0.0.1:9".to_string(),
            censorship_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
        },
        ..Config::default()
    };
    create_router(AppState::from_config(Arc::new(config)).unwrap())
}

fn get(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_server_stops_on_cancel() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let state = AppState::from_config(Arc::new(Config::default())).unwrap();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(serve(listener, state, cancel.clone()));

    let response = reqwest::get(format!("http://{}/health", address)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after cancellation")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = offline_router();

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let app = create_router(AppState::from_config(Arc::new(config)).unwrap());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_response_carries_request_id_header() {
    let response = offline_router()
        .oneshot(get("/health?request_id=abc123"))
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc123");
}

#[tokio::test]
async fn test_generated_request_id_header() {
    let response = offline_router().oneshot(get("/health")).await.unwrap();

    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
}
