// ==========================
// tests/integration/gateway_flow_tests.rs
// ==========================
//! Gateway over HTTP, in front of real and scripted upstreams
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{Response, StatusCode as AxumStatus},
    routing::get,
    Json, Router,
};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use warden_lib::gateway::{ForwardError, Forwarder, HttpForwarder};
use crate::test_utils::{
    credentials, dead_addr, spawn, spawn_auth, spawn_gateway, spawn_gateway_with, TEST_SECRET,
};

/// Upstream that describes the request it received
async fn echo(request: Request) -> (AxumStatus, [(&'static str, &'static str); 1], Json<Value>) {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let headers: serde_json::Map<String, Value> = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();

    (
        AxumStatus::ACCEPTED,
        [("x-echo", "1")],
        Json(json!({
            "method": parts.method.as_str(),
            "path": parts.uri.path(),
            "query": parts.uri.query(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        })),
    )
}

async fn spawn_echo() -> String {
    let addr = spawn(Router::new().fallback(echo)).await;
    format!("http://{addr}")
}

#[tokio::test]
async fn test_gateway_relays_to_auth_service() {
    let (auth_addr, _) = spawn_auth().await;
    let gateway = spawn_gateway(&[("auth", "/auth", format!("http://{auth_addr}"))]).await;
    let client = reqwest::Client::new();

    let signup = client
        .post(format!("http://{gateway}/auth/signup"))
        .json(&credentials("frank", "pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(signup.status(), StatusCode::CREATED);

    let login = client
        .post(format!("http://{gateway}/auth/login"))
        .json(&credentials("frank", "pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let body: Value = login.json().await.unwrap();

    let key = warden_lib::auth::SigningKey::new(TEST_SECRET).unwrap();
    let claims = warden_lib::auth::TokenIssuer::new(&key)
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, "frank");

    // Upstream errors pass through untouched
    let conflict = client
        .post(format!("http://{gateway}/auth/signup"))
        .json(&credentials("frank", "pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_request_is_rewritten_and_annotated() {
    let upstream = spawn_echo().await;
    let gateway = spawn_gateway(&[("users", "/users", format!("{upstream}/api"))]).await;

    let response = reqwest::Client::new()
        .put(format!("http://{gateway}/users/42/profile?expand=true"))
        .header("authorization", "Bearer abc")
        .header("connection", "keep-alive, x-hop")
        .header("x-hop", "drop-me")
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers().get("x-echo").unwrap(), "1");
    assert!(response.headers().contains_key("x-request-id"));

    let seen: Value = response.json().await.unwrap();
    assert_eq!(seen["method"], "PUT");
    assert_eq!(seen["path"], "/api/42/profile");
    assert_eq!(seen["query"], "expand=true");
    assert_eq!(seen["body"], "hello");
    assert_eq!(seen["headers"]["authorization"], "Bearer abc");
    assert_eq!(seen["headers"]["x-forwarded-for"], "127.0.0.1");
    assert_eq!(seen["headers"]["x-forwarded-host"], gateway.to_string());
    assert!(seen["headers"]["x-request-id"].is_string());
    assert!(seen["headers"].get("x-hop").is_none());
}

#[tokio::test]
async fn test_bare_prefix_maps_to_upstream_root() {
    let upstream = spawn_echo().await;
    let gateway = spawn_gateway(&[("auth", "/auth", upstream)]).await;

    let seen: Value = reqwest::get(format!("http://{gateway}/auth"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seen["path"], "/");
}

/// Counts calls and never answers
#[derive(Default)]
struct CountingForwarder {
    calls: AtomicUsize,
}

#[async_trait]
impl Forwarder for CountingForwarder {
    async fn forward(
        &self,
        target: Url,
        _request: Request<Body>,
    ) -> Result<Response<Body>, ForwardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ForwardError::Connect {
            upstream: target.to_string(),
            reason: "not expected".to_string(),
        })
    }
}

#[tokio::test]
async fn test_unregistered_prefix_is_404_without_upstream_call() {
    let forwarder = Arc::new(CountingForwarder::default());
    let gateway = spawn_gateway_with(
        &[("auth", "/auth", "http://auth.invalid:8080".to_string())],
        forwarder.clone(),
    )
    .await;

    for path in ["/nonexistent/x", "/authority", "/"] {
        let response = reqwest::get(format!("http://{gateway}{path}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "GW_001");
    }

    assert_eq!(forwarder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_upstream_is_502() {
    let dead = dead_addr().await;
    let gateway = spawn_gateway(&[("auth", "/auth", format!("http://{dead}"))]).await;

    let started = Instant::now();
    let response = reqwest::get(format!("http://{gateway}/auth/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(5));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "GW_002");
}

#[tokio::test]
async fn test_slow_upstream_is_503() {
    let slow = spawn(Router::new().route(
        "/login",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "too late"
        }),
    ))
    .await;

    let forwarder =
        HttpForwarder::with_timeouts(Duration::from_secs(1), Duration::from_millis(200)).unwrap();
    let gateway = spawn_gateway_with(
        &[("auth", "/auth", format!("http://{slow}"))],
        Arc::new(forwarder),
    )
    .await;

    let started = Instant::now();
    let response = reqwest::get(format!("http://{gateway}/auth/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(started.elapsed() < Duration::from_secs(3));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "GW_003");
}

#[tokio::test]
async fn test_gateway_health_is_local() {
    let dead = dead_addr().await;
    let gateway = spawn_gateway(&[("auth", "/auth", format!("http://{dead}"))]).await;

    let response = reqwest::get(format!("http://{gateway}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
