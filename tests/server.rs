//! Integration tests for the HTTP server: health endpoint, forwarding
//! through the middleware chain, upstream failures, and graceful shutdown.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Json;
use edgeip::config::model::{Config, Defaults, Middleware};
use edgeip::config::ConfigVersion;
use edgeip::health::HealthResponse;
use edgeip::middleware::rename_headers;
use edgeip::server::{self, AppState};

type EchoedHeaders = HashMap<String, Vec<String>>;

/// Upstream that replies with the request headers it received.
async fn echo(headers: HeaderMap) -> Json<EchoedHeaders> {
    let mut echoed = EchoedHeaders::new();
    for (name, value) in &headers {
        echoed
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }
    Json(echoed)
}

async fn start_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, axum::Router::new().fallback(echo))
            .await
            .unwrap();
    });
    addr
}

fn cloudflare(name: &str) -> Middleware {
    Middleware {
        name: name.into(),
        plugin: rename_headers::Config::default().into(),
    }
}

fn test_config(upstream: &str, middlewares: Vec<Middleware>) -> Config {
    Config {
        upstream: upstream.into(),
        defaults: Defaults {
            timeout: 2000,
            ..Defaults::default()
        },
        middlewares,
    }
}

async fn start_proxy(config: Config) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let state = Arc::new(
        AppState::new(
            config,
            ConfigVersion::Hash("test-hash-0123".into()),
            "test",
            "test",
        )
        .unwrap(),
    );

    let router = server::build_router(state, 1_048_576).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

async fn start_cloudflare_proxy() -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let upstream = start_upstream().await;
    start_proxy(test_config(
        &format!("http://{upstream}"),
        vec![cloudflare("cloudflare")],
    ))
    .await
}

async fn forwarded_headers(addr: SocketAddr, headers: &[(&str, &str)]) -> EchoedHeaders {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("http://{addr}/whoami?via=test"));
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let resp = request.send().await.unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let (addr, shutdown) = start_proxy(test_config(
        "http://127.0.0.1:9",
        vec![cloudflare("cloudflare")],
    ))
    .await;

    let url = format!("http://{addr}/health");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.proxy.source, "test");
    assert_eq!(health.proxy.digest, "test-has");
    assert_eq!(health.proxy.upstream, "http://127.0.0.1:9");
    assert_eq!(health.proxy.chain, ["cloudflare"]);
    assert_eq!(health.requests.forwarded, 0);
    assert_eq!(health.requests.failed, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn cf_connecting_ip_reaches_upstream_as_forwarded_for() {
    let (addr, shutdown) = start_cloudflare_proxy().await;

    let seen = forwarded_headers(addr, &[("CF-Connecting-IP", "203.0.113.42")]).await;
    assert_eq!(seen["x-forwarded-for"], ["203.0.113.42, 127.0.0.1"]);
    assert_eq!(seen["x-real-ip"], ["203.0.113.42"]);
    assert_eq!(seen["cf-connecting-ip"], ["203.0.113.42"]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn cf_connecting_ip_replaces_existing_chain() {
    let (addr, shutdown) = start_cloudflare_proxy().await;

    let seen = forwarded_headers(
        addr,
        &[
            ("CF-Connecting-IP", "203.0.113.42"),
            ("X-Forwarded-For", "198.51.100.24"),
        ],
    )
    .await;
    assert_eq!(seen["x-forwarded-for"], ["203.0.113.42, 127.0.0.1"]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn client_supplied_chain_gets_the_peer_appended() {
    let (addr, shutdown) = start_cloudflare_proxy().await;

    let seen = forwarded_headers(addr, &[("X-Forwarded-For", "198.51.100.24")]).await;
    assert_eq!(seen["x-forwarded-for"], ["198.51.100.24, 127.0.0.1"]);
    assert_eq!(seen["x-real-ip"], ["198.51.100.24"]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn peer_address_used_when_nothing_is_set() {
    let (addr, shutdown) = start_cloudflare_proxy().await;

    let seen = forwarded_headers(addr, &[]).await;
    assert_eq!(seen["x-forwarded-for"], ["127.0.0.1"]);
    assert!(seen.contains_key("x-correlation-id"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn without_middleware_the_chain_is_kept() {
    let upstream = start_upstream().await;
    let (addr, shutdown) =
        start_proxy(test_config(&format!("http://{upstream}"), Vec::new())).await;

    let seen = forwarded_headers(
        addr,
        &[
            ("CF-Connecting-IP", "203.0.113.42"),
            ("X-Forwarded-For", "198.51.100.24"),
        ],
    )
    .await;
    assert_eq!(seen["x-forwarded-for"], ["198.51.100.24, 127.0.0.1"]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn chained_instances_behave_like_one() {
    let upstream = start_upstream().await;
    let (addr, shutdown) = start_proxy(test_config(
        &format!("http://{upstream}"),
        vec![cloudflare("edge"), cloudflare("edge-again")],
    ))
    .await;

    let seen = forwarded_headers(
        addr,
        &[
            ("CF-Connecting-IP", "203.0.113.42"),
            ("X-Forwarded-For", "198.51.100.24"),
        ],
    )
    .await;
    assert_eq!(seen["x-forwarded-for"], ["203.0.113.42, 127.0.0.1"]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_upstream_returns_502() {
    // grab a free port, then close it
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (addr, shutdown) = start_proxy(test_config(&format!("http://{closed}"), Vec::new())).await;

    let resp = reqwest::get(format!("http://{addr}/anything")).await.unwrap();
    assert_eq!(resp.status(), 502);

    let health: HealthResponse = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.requests.failed, 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (addr, shutdown) = start_cloudflare_proxy().await;

    // Verify server is running
    let url = format!("http://{addr}/health");
    assert!(reqwest::get(&url).await.is_ok());

    // Send shutdown
    let _ = shutdown.send(());

    // Give it a moment to shut down
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    // Server should no longer accept connections
    let result = reqwest::get(&url).await;
    assert!(result.is_err());
}
