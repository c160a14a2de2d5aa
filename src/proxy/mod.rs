//! The forwarding fallback.
//!
//! Every request that is not `/health` lands in [`forward_handler`] after
//! the middleware chain has run. [`headers`] builds what the upstream sees
//! and [`upstream`] makes the timed call.

pub mod headers;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::EdgeIpError;
use crate::server::AppState;

pub const CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Reuse the caller's correlation id, or mint one.
fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(&CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

/// Turn the collected upstream reply into the client response.
fn relay(reply: upstream::UpstreamResponse, correlation_id: &str) -> Response {
    let upstream::UpstreamResponse {
        status,
        headers: mut reply_headers,
        body,
    } = reply;

    headers::strip_response_hop_by_hop(&mut reply_headers);
    if let Ok(id) = HeaderValue::from_str(correlation_id) {
        reply_headers.insert(CORRELATION_ID, id);
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = reply_headers;
    response
}

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = correlation_id(&req_headers);
    let target = upstream::upstream_url(&state.upstream, &uri);
    let defaults = &state.config.defaults;

    tracing::debug!(
        correlation_id = %correlation_id,
        peer = %peer,
        method = %method,
        target = %target,
        "forwarding"
    );

    let request = upstream::UpstreamRequest {
        client: &state.http_client,
        method,
        url: &target,
        headers: headers::build_forwarded_headers(
            &req_headers,
            &peer.ip().to_string(),
            &target,
            defaults,
            &correlation_id,
        ),
        body,
        timeout_ms: defaults.timeout,
    };

    let outcome = upstream::send(request).await;
    state.stats.record(outcome.is_ok());

    match outcome {
        Ok(reply) => relay(reply, &correlation_id),
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                target = %target,
                error = %e,
                "upstream request failed"
            );
            let status = match e {
                EdgeIpError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            };
            status.into_response()
        }
    }
}
