//! Request middleware loaded by name from configuration.
//!
//! [`rename_headers`] holds the `CF-Connecting-IP` to `X-Forwarded-For`
//! rewriter, usable both as a Tower layer and as a sink-style [`Handler`].
//! [`sink`] defines the response sink abstraction that sink-style handlers
//! write to, and the capability-forwarding
//! [`ResponseWriter`](sink::ResponseWriter).

pub mod rename_headers;
pub mod sink;

use std::convert::Infallible;
use std::future::{ready, Ready};
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use tower::Service;

use sink::{Recorder, ResponseSink, ResponseWriter};

/// Host-side environment handed to every middleware factory.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    pub namespace: String,
}

impl HostContext {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

/// A handler that writes its response to a [`ResponseSink`] instead of
/// returning one.
pub trait Handler<B> {
    fn serve_http(&self, rw: &mut dyn ResponseSink, req: &mut Request<B>);
}

impl<F, B> Handler<B> for F
where
    F: Fn(&mut dyn ResponseSink, &mut Request<B>),
{
    fn serve_http(&self, rw: &mut dyn ResponseSink, req: &mut Request<B>) {
        self(rw, req);
    }
}

/// Runs a sink-style [`Handler`] as a Tower service.
///
/// Each call records the handler's output into a fresh [`Recorder`],
/// handed to the handler through a [`ResponseWriter`], and returns it
/// as a buffered response.
#[derive(Debug, Clone)]
pub struct HandlerService<H> {
    handler: H,
}

impl<H> HandlerService<H> {
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<H, B> Service<Request<B>> for HandlerService<H>
where
    H: Handler<B>,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let mut recorder = Recorder::new();
        let mut writer = ResponseWriter::new(&mut recorder);
        self.handler.serve_http(&mut writer, &mut req);
        ready(Ok(recorder.into_response()))
    }
}
