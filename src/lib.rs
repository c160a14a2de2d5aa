//! edgeip promotes the CDN edge's client address to `X-Forwarded-For`.
//!
//! When a request carries a non-empty `CF-Connecting-IP`, the
//! [`rename_headers`](middleware::rename_headers) middleware writes that
//! value over every `X-Forwarded-For` value before the next handler runs.
//! It is usable on its own, as a Tower layer or as a sink-style
//! [`Handler`](middleware::Handler), or inside the bundled proxy, which
//! loads named middleware instances from a config file and forwards to one
//! upstream.
//!
//! Library pieces: [`middleware`] (the rewriter and the
//! [`ResponseSink`](middleware::sink::ResponseSink) abstraction),
//! [`config`], [`error`].
//!
//! Proxy pieces: [`server`] (state, router, shutdown), [`proxy`] (the
//! forwarding fallback), [`health`], [`logging`], [`cli`] and [`cmd`].
//!
//! Config formats are features: `yaml` (default), `json`, `toml`;
//! `file-backends` and `full` turn on all three.

#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;
