// ============================================================================
// Forwarder
// ============================================================================
//
// HTTP client side of the gateway. Handles:
// - Hop-by-hop header removal in both directions
// - Streaming request and response bodies
// - Bounded connect and response-head timeouts
//
// No retries happen here. A retry/backoff policy is a `Forwarder` wrapping
// another `Forwarder`.
//
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response};
use reqwest::Url;
use thiserror::Error;

use crate::config::{ConfigError, GatewaySettings};

/// Headers that describe a single connection and are never forwarded
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Why a request could not be relayed
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("could not reach {upstream}: {reason}")]
    Connect { upstream: String, reason: String },

    #[error("{upstream} did not respond within {after:?}")]
    Timeout { upstream: String, after: Duration },
}

/// Sends one request to an upstream and hands back its response
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, target: Url, request: Request<Body>)
        -> Result<Response<Body>, ForwardError>;
}

/// Forwarder backed by a pooled `reqwest` client
pub struct HttpForwarder {
    client: reqwest::Client,
    response_timeout: Duration,
}

impl HttpForwarder {
    pub fn new(settings: &GatewaySettings) -> Result<Self, ConfigError> {
        Self::with_timeouts(settings.connect_timeout(), settings.upstream_timeout())
    }

    pub fn with_timeouts(
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        // Configure connection pooling and keep-alive
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            // Redirects belong to the client, relay them as-is
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            response_timeout,
        })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        target: Url,
        request: Request<Body>,
    ) -> Result<Response<Body>, ForwardError> {
        let upstream = origin(&target);
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        let size = body.size_hint().exact();
        if let Some(len) = size {
            if len > 0 && !headers.contains_key(header::CONTENT_LENGTH) {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
            }
        }

        let mut outbound = self.client.request(parts.method, target).headers(headers);
        if size != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        // Bounds the wait for the response head only; bodies stream unbounded.
        let response = match tokio::time::timeout(self.response_timeout, outbound.send()).await {
            Err(_) => {
                return Err(ForwardError::Timeout {
                    upstream,
                    after: self.response_timeout,
                })
            },
            Ok(Err(e)) if e.is_timeout() => {
                return Err(ForwardError::Timeout {
                    upstream,
                    after: self.response_timeout,
                })
            },
            Ok(Err(e)) => {
                return Err(ForwardError::Connect {
                    upstream,
                    reason: e.to_string(),
                })
            },
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut relayed = Response::new(Body::from_stream(response.bytes_stream()));
        *relayed.status_mut() = status;
        *relayed.headers_mut() = headers;
        Ok(relayed)
    }
}

/// Remove the fixed hop-by-hop set plus anything named in `Connection`
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// `scheme://host:port` of a target, for logs and error messages
fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
