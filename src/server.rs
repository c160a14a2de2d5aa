//! The proxy's HTTP surface.
//!
//! [`AppState`] is shared by every request: the loaded config, the parsed
//! upstream, the pooled client, and counters. [`build_router`] puts the
//! configured middleware chain in front of `/health` and the forwarding
//! fallback. [`shutdown_signal`] resolves when the process is asked to stop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use http_body_util::Full;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::model::Config;
use crate::config::ConfigVersion;
use crate::error::EdgeIpError;
use crate::health;
use crate::middleware::rename_headers::RenameHeadersLayer;
use crate::middleware::HostContext;
use crate::proxy;

/// Pooled upstream client; speaks plain HTTP or TLS depending on the URL.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Outcome counters for forwarded requests.
#[derive(Debug, Default)]
pub struct Stats {
    forwarded: AtomicU64,
    failed: AtomicU64,
}

impl Stats {
    pub fn record(&self, delivered: bool) {
        let counter = if delivered {
            &self.forwarded
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// `(forwarded, failed)` so far.
    #[must_use]
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.forwarded.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

pub struct AppState {
    pub config: Config,
    pub version: ConfigVersion,
    pub source_name: String,
    pub namespace: String,
    pub upstream: Url,
    pub http_client: HttpClient,
    pub started: Instant,
    pub stats: Stats,
}

impl AppState {
    /// Fails only when `config.upstream` is not a URL, which validation
    /// normally rules out first.
    pub fn new(
        config: Config,
        version: ConfigVersion,
        source_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, EdgeIpError> {
        let upstream =
            Url::parse(&config.upstream).map_err(|source| EdgeIpError::InvalidUpstream {
                url: config.upstream.clone(),
                source,
            })?;

        Ok(Self {
            config,
            version,
            source_name: source_name.into(),
            namespace: namespace.into(),
            upstream,
            http_client: upstream_client(),
            started: Instant::now(),
            stats: Stats::default(),
        })
    }
}

fn upstream_client() -> HttpClient {
    // Several rustls providers may be linked in; pin ring before building.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(connector)
}

/// Build the router: `/health`, the forwarding fallback, and the configured
/// middleware chain in front of both.
///
/// The first middleware listed in the config is the outermost layer, so it
/// sees the request first.
pub fn build_router(state: Arc<AppState>, max_body: usize) -> Result<Router, EdgeIpError> {
    let ctx = HostContext::new(state.namespace.clone());

    let mut router = Router::new()
        .route("/health", get(health::health_handler))
        .fallback(proxy::forward_handler);

    for middleware in state.config.middlewares.iter().rev() {
        if let Some(config) = &middleware.plugin.rename_headers {
            router = router.layer(RenameHeadersLayer::new(
                &ctx,
                config,
                middleware.name.as_str(),
            )?);
        }
    }

    let edge = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body));

    Ok(router.layer(edge).with_state(state))
}

/// Resolves on Ctrl+C, or on SIGTERM where signals exist.
pub async fn shutdown_signal() {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "shutting down, draining in-flight requests");
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, only Ctrl+C stops the proxy");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
