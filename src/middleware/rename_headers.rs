//! Promote `CF-Connecting-IP` to `X-Forwarded-For`.
//!
//! When a request carries a non-empty `CF-Connecting-IP` header, its value
//! replaces every existing `X-Forwarded-For` value. Otherwise the request
//! passes through untouched. No other header is read or written, and the
//! next handler is always called exactly once.
//!
//! The rewriter is available as a Tower middleware ([`RenameHeadersLayer`] /
//! [`RenameHeaders`]) and as a sink-style [`Handler`].

use std::sync::Arc;
use std::task::{Context, Poll};

use http::{HeaderMap, HeaderName, Request};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};

use super::sink::ResponseSink;
use super::{Handler, HostContext};
use crate::error::EdgeIpError;

pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Plugin configuration. There are no options yet; unknown keys are
/// rejected when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {}

/// Copy the first `CF-Connecting-IP` value over `X-Forwarded-For`.
///
/// Returns `true` when the headers were changed.
pub fn rewrite_forwarded_for(headers: &mut HeaderMap) -> bool {
    let Some(client_ip) = headers
        .get(&CF_CONNECTING_IP)
        .filter(|value| !value.is_empty())
        .cloned()
    else {
        return false;
    };

    // insert, not append: prior values are dropped
    headers.insert(X_FORWARDED_FOR, client_ip);
    true
}

#[derive(Debug, Clone)]
pub struct RenameHeadersLayer {
    name: Arc<str>,
}

impl RenameHeadersLayer {
    pub fn new(
        ctx: &HostContext,
        config: &Config,
        name: impl Into<Arc<str>>,
    ) -> Result<Self, EdgeIpError> {
        let Config {} = config;
        let name = name.into();

        tracing::info!(
            namespace = %ctx.namespace,
            middleware = %name,
            "rename_headers middleware loaded"
        );

        Ok(Self { name })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> Layer<S> for RenameHeadersLayer {
    type Service = RenameHeaders<S>;

    fn layer(&self, next: S) -> Self::Service {
        RenameHeaders {
            name: Arc::clone(&self.name),
            next,
        }
    }
}

/// A named rewriter instance in front of `next`.
///
/// Immutable once built; clones share the name.
#[derive(Debug, Clone)]
pub struct RenameHeaders<S> {
    name: Arc<str>,
    next: S,
}

impl<S> RenameHeaders<S> {
    pub fn new(
        ctx: &HostContext,
        next: S,
        config: &Config,
        name: impl Into<Arc<str>>,
    ) -> Result<Self, EdgeIpError> {
        RenameHeadersLayer::new(ctx, config, name).map(|layer| layer.layer(next))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn rewrite(&self, headers: &mut HeaderMap) {
        if rewrite_forwarded_for(headers) {
            tracing::debug!(
                middleware = %self.name,
                client_ip = ?headers.get(&X_FORWARDED_FOR),
                "x-forwarded-for set from cf-connecting-ip"
            );
        }
    }
}

impl<S, B> Service<Request<B>> for RenameHeaders<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        self.rewrite(req.headers_mut());
        self.next.call(req)
    }
}

impl<H, B> Handler<B> for RenameHeaders<H>
where
    H: Handler<B>,
{
    fn serve_http(&self, rw: &mut dyn ResponseSink, req: &mut Request<B>) {
        self.rewrite(req.headers_mut());
        self.next.serve_http(rw, req);
    }
}
