//! Single-upstream request dispatch.
//!
//! [`upstream_url`] maps an incoming request URI onto the configured
//! upstream base, and [`send`] issues the request through the pooled
//! client with a timeout, collecting the response body.

use std::time::{Duration, Instant};

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use url::Url;

use crate::error::EdgeIpError;
use crate::server::HttpClient;

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct UpstreamRequest<'a> {
    pub client: &'a HttpClient,
    pub method: Method,
    pub url: &'a Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub timeout_ms: u64,
}

/// Append the request path and query to the upstream base path.
#[must_use]
pub fn upstream_url(base: &Url, uri: &Uri) -> Url {
    let mut url = base.clone();
    let base_path = base.path().trim_end_matches('/');
    url.set_path(&format!("{base_path}{}", uri.path()));
    url.set_query(uri.query());
    url
}

#[allow(clippy::cast_possible_truncation)]
pub async fn send(req: UpstreamRequest<'_>) -> Result<UpstreamResponse, EdgeIpError> {
    let start = Instant::now();

    let mut builder = hyper::Request::builder()
        .method(req.method)
        .uri(req.url.as_str());
    if let Some(headers) = builder.headers_mut() {
        *headers = req.headers;
    }
    let request = builder
        .body(Full::new(req.body))
        .map_err(|e| EdgeIpError::HttpRequest {
            source: Box::new(e),
        })?;

    let timeout = Duration::from_millis(req.timeout_ms);
    let response = tokio::time::timeout(timeout, req.client.request(request))
        .await
        .map_err(|_| EdgeIpError::UpstreamTimeout(req.timeout_ms))?
        .map_err(|e| EdgeIpError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| EdgeIpError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    tracing::debug!(
        target = %req.url,
        status = status.as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "upstream responded"
    );

    Ok(UpstreamResponse {
        status,
        headers,
        body,
    })
}
