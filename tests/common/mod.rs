//! Shared utilities for integration tests.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use env_gateway::config::parse_config;
use env_gateway::HttpServer;

/// Build the fully layered gateway router from TOML text.
pub fn gateway(toml: &str) -> Router {
    let config = parse_config(toml).expect("test config must be valid");
    HttpServer::new(config).router()
}

/// Send one request through `router` and return status and body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Send one request and decode the JSON echo body.
#[allow(dead_code)]
pub async fn send_json(router: Router, request: Request<Body>) -> Value {
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    serde_json::from_str(&body).unwrap()
}

pub fn get(host: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder().uri(uri).header("host", host)
}
