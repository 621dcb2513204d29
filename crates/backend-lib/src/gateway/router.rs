// ============================
// crates/backend-lib/src/gateway/router.rs
// ============================
//! HTTP surface of the gateway: `/health` plus a catch-all that proxies.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics::counter;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, warn};
use uuid::Uuid;
use warden_common::HealthResponse;

use crate::error::{panic_response, AppError};
use crate::gateway::GatewayState;
use crate::metrics::{GATEWAY_FORWARDED, GATEWAY_ROUTE_NOT_FOUND, GATEWAY_UPSTREAM_ERROR};

pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Create the gateway router
pub fn create_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(route_request)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Resolve the path, rewrite it and relay the request upstream
async fn route_request(State(state): State<Arc<GatewayState>>, mut request: Request) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let Some(matched) = state.routes.resolve(&path) else {
        counter!(GATEWAY_ROUTE_NOT_FOUND).increment(1);
        debug!(%path, "no route");
        return AppError::RouteNotFound(path).into_response();
    };

    let target = matched.entry.target_url(&matched.path, query.as_deref());
    let route = matched.entry.name.clone();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let request_id = annotate(request.headers_mut(), peer.map(|ip| ip.to_string()));

    debug!(%route, %target, request_id = %request_id, "forwarding");

    match state.forwarder.forward(target, request).await {
        Ok(mut response) => {
            counter!(GATEWAY_FORWARDED, "route" => route).increment(1);
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().entry(REQUEST_ID).or_insert(value);
            }
            response
        },
        Err(e) => {
            counter!(GATEWAY_UPSTREAM_ERROR, "route" => route.clone()).increment(1);
            warn!(%route, request_id = %request_id, error = %e, "upstream failed");
            AppError::from(e).into_response()
        },
    }
}

/// Add request id and forwarding headers, returning the request id in use
fn annotate(headers: &mut HeaderMap<HeaderValue>, peer: Option<String>) -> String {
    let request_id = match headers.get(&REQUEST_ID).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.is_empty() => existing.to_string(),
        _ => {
            let generated = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&generated) {
                headers.insert(REQUEST_ID, value);
            }
            generated
        },
    };

    if let Some(peer) = peer {
        let chain = match headers.get(&FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{prior}, {peer}"),
            None => peer,
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(FORWARDED_FOR, value);
        }
    }

    if let Some(host) = headers.get(header::HOST).cloned() {
        headers.entry(FORWARDED_HOST).or_insert(host);
    }

    request_id
}
