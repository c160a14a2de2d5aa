//! Response sinks and the capability-forwarding [`ResponseWriter`].
//!
//! A [`ResponseSink`] is the outbound side of a sink-style
//! [`Handler`](super::Handler): headers, status, and a byte stream.
//! Connection takeover ([`Hijack`]) and explicit flushing ([`Flush`]) are
//! optional capabilities exposed through accessor methods that return
//! `None` when the sink does not have them.
//!
//! [`ResponseWriter`] wraps any sink and always offers both capabilities:
//! takeover is delegated or reported as [`SinkError::HijackUnsupported`],
//! flush is delegated or silently skipped.
//!
//! [`Recorder`] is the in-memory sink used by
//! [`HandlerService`](super::HandlerService) to turn a sink-style handler
//! into an `http::Response`.

use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::SinkError;

/// Raw duplex transport handed out by a connection takeover.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// A connection taken over from a sink.
///
/// `read_buf` holds bytes the sink had already read off the wire but not
/// yet handed to anyone; callers must consume it before reading from `io`.
pub struct Hijacked {
    pub io: Box<dyn Connection>,
    pub read_buf: Bytes,
}

impl std::fmt::Debug for Hijacked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hijacked")
            .field("read_buf", &self.read_buf.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Hijack,
    Flush,
}

pub trait Hijack {
    fn hijack(&mut self) -> Result<Hijacked, SinkError>;
}

pub trait Flush {
    fn flush(&mut self);
}

pub trait ResponseSink {
    fn headers(&mut self) -> &mut HeaderMap;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn set_status(&mut self, status: StatusCode);

    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        None
    }

    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        None
    }

    fn supports(&mut self, capability: Capability) -> bool {
        match capability {
            Capability::Hijack => self.hijacker().is_some(),
            Capability::Flush => self.flusher().is_some(),
        }
    }
}

impl<T: ResponseSink + ?Sized> ResponseSink for &mut T {
    fn headers(&mut self) -> &mut HeaderMap {
        (**self).headers()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status);
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        (**self).hijacker()
    }

    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        (**self).flusher()
    }
}

/// Transparent wrapper that forwards every sink operation unchanged.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: ResponseSink> ResponseWriter<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: ResponseSink> ResponseSink for ResponseWriter<W> {
    fn headers(&mut self) -> &mut HeaderMap {
        self.writer.headers()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn set_status(&mut self, status: StatusCode) {
        self.writer.set_status(status);
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        Some(self)
    }

    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        Some(self)
    }
}

impl<W: ResponseSink> Hijack for ResponseWriter<W> {
    fn hijack(&mut self) -> Result<Hijacked, SinkError> {
        match self.writer.hijacker() {
            Some(hijacker) => hijacker.hijack(),
            None => Err(SinkError::HijackUnsupported {
                sink: std::any::type_name::<W>(),
            }),
        }
    }
}

impl<W: ResponseSink> Flush for ResponseWriter<W> {
    fn flush(&mut self) {
        if let Some(flusher) = self.writer.flusher() {
            flusher.flush();
        }
    }
}

/// In-memory sink that records everything written to it.
#[derive(Default)]
pub struct Recorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    flushed: bool,
    connection: Option<Box<dyn Connection>>,
    hijacked: bool,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that can hand `io` out through [`Hijack`].
    #[must_use]
    pub fn with_connection(io: impl Connection + 'static) -> Self {
        Self {
            connection: Some(Box::new(io)),
            ..Self::default()
        }
    }

    /// Status set by the handler, `200 OK` if it never set one.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    #[must_use]
    pub const fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub const fn flushed(&self) -> bool {
        self.flushed
    }

    #[must_use]
    pub const fn hijacked(&self) -> bool {
        self.hijacked
    }

    #[must_use]
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status();
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for Recorder {
    fn headers(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.hijacked {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                SinkError::AlreadyHijacked,
            ));
        }
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn set_status(&mut self, status: StatusCode) {
        // first status wins, later calls are ignored
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijack> {
        if self.connection.is_some() || self.hijacked {
            Some(self)
        } else {
            None
        }
    }

    fn flusher(&mut self) -> Option<&mut dyn Flush> {
        Some(self)
    }
}

impl Hijack for Recorder {
    fn hijack(&mut self) -> Result<Hijacked, SinkError> {
        let io = self.connection.take().ok_or(SinkError::AlreadyHijacked)?;
        self.hijacked = true;
        Ok(Hijacked {
            io,
            read_buf: Bytes::new(),
        })
    }
}

impl Flush for Recorder {
    fn flush(&mut self) {
        self.flushed = true;
    }
}
