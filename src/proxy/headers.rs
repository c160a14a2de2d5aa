//! Header construction, forwarding, and hop-by-hop stripping.
//!
//! [`build_forwarded_headers`] clones the client headers (after the
//! middleware chain has run), strips hop-by-hop headers, rewrites `Host`,
//! and fills in proxy metadata (`X-Forwarded-For`, `X-Real-IP`,
//! `X-Forwarded-Proto`, `X-Forwarded-Host`, `Via`, `X-Correlation-Id`).
//!
//! The peer address is always appended to the `X-Forwarded-For` chain.
//! Whatever came before it, whether written by the client or by
//! [`rename_headers`](crate::middleware::rename_headers), is kept as the
//! leading hops, and `X-Real-IP` is the first of them. Those leading hops
//! are only as trustworthy as the edge in front of this proxy: run it where
//! the edge is the only way in, and treat the last hop as the one address
//! this proxy vouches for.

use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::model::Defaults;
use crate::middleware::rename_headers::X_FORWARDED_FOR;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Strip hop-by-hop headers and `content-length` from an upstream response.
///
/// The body has already been fully collected, so `transfer-encoding` and
/// `content-length` from the origin are no longer accurate. Axum will set
/// the correct `content-length` based on the actual body bytes.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(hyper::header::CONTENT_LENGTH);
}

/// Append `peer` to `X-Forwarded-For`, folding repeated header lines into
/// one comma-separated value. Returns the first hop of the new chain.
fn extend_forwarded_chain(headers: &mut HeaderMap, peer: &str) -> String {
    let mut hops: Vec<String> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(String::from)
        .collect();
    hops.push(peer.to_string());

    if let Ok(chain) = HeaderValue::from_str(&hops.join(", ")) {
        headers.insert(X_FORWARDED_FOR, chain);
    }
    hops.swap_remove(0)
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    client_ip: &str,
    target_url: &url::Url,
    defaults: &Defaults,
    correlation_id: &str,
) -> HeaderMap {
    let mut headers = original.clone();

    if defaults.strip_hop_by_hop {
        for header_name in HOP_BY_HOP.iter() {
            headers.remove(header_name);
        }
    }

    // Rewrite Host
    if let Some(host) = target_url.host_str() {
        let host_value = target_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert("host", val);
        }
    }

    if !defaults.proxy_headers {
        return headers;
    }

    let real_ip = extend_forwarded_chain(&mut headers, client_ip);
    if let Ok(val) = HeaderValue::from_str(&real_ip) {
        headers.insert("x-real-ip", val);
    }

    // X-Forwarded-Proto: this listener only speaks plain HTTP
    if !headers.contains_key("x-forwarded-proto") {
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
    }

    // X-Forwarded-Host (original Host the client targeted)
    if !headers.contains_key("x-forwarded-host") {
        if let Some(original_host) = original.get("host") {
            headers.insert("x-forwarded-host", original_host.clone());
        }
    }

    headers.append("via", HeaderValue::from_static("1.1 edgeip"));

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert("x-correlation-id", val);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> url::Url {
        url::Url::parse("http://backend:9090/path").unwrap()
    }

    fn build(original: &HeaderMap) -> HeaderMap {
        build_forwarded_headers(
            original,
            "10.0.0.1",
            &target(),
            &Defaults::default(),
            "test-id",
        )
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let result = build(&original);

        assert!(result.get("connection").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn keeps_hop_by_hop_when_disabled() {
        let mut original = HeaderMap::new();
        original.insert("te", "trailers".parse().unwrap());
        let defaults = Defaults {
            strip_hop_by_hop: false,
            ..Defaults::default()
        };

        let result =
            build_forwarded_headers(&original, "10.0.0.1", &target(), &defaults, "test-id");
        assert_eq!(result.get("te").unwrap(), "trailers");
    }

    #[test]
    fn rewrites_host() {
        let mut original = HeaderMap::new();
        original.insert("host", "edge.example.com".parse().unwrap());

        let result = build(&original);

        assert_eq!(result.get("host").unwrap(), "backend:9090");
        assert_eq!(result.get("x-forwarded-host").unwrap(), "edge.example.com");
    }

    #[test]
    fn peer_address_used_when_forwarded_for_absent() {
        let result = build(&HeaderMap::new());
        assert_eq!(result.get("x-forwarded-for").unwrap(), "10.0.0.1");
        assert_eq!(result.get("x-real-ip").unwrap(), "10.0.0.1");
    }

    #[test]
    fn peer_appended_to_existing_forwarded_for() {
        let mut original = HeaderMap::new();
        original.insert("x-forwarded-for", "203.0.113.42".parse().unwrap());

        let result = build(&original);

        let chain: Vec<_> = result.get_all("x-forwarded-for").iter().collect();
        assert_eq!(chain, ["203.0.113.42, 10.0.0.1"]);
        assert_eq!(result.get("x-real-ip").unwrap(), "203.0.113.42");
    }

    #[test]
    fn spoofed_chain_still_records_the_peer() {
        let mut original = HeaderMap::new();
        original.append("x-forwarded-for", "1.1.1.1".parse().unwrap());
        original.append("x-forwarded-for", " 2.2.2.2 ,".parse().unwrap());

        let result = build(&original);

        let chain: Vec<_> = result.get_all("x-forwarded-for").iter().collect();
        assert_eq!(chain, ["1.1.1.1, 2.2.2.2, 10.0.0.1"]);
    }

    #[test]
    fn real_ip_is_first_hop() {
        let mut original = HeaderMap::new();
        original.insert("x-forwarded-for", "1.2.3.4, 5.6.7.8".parse().unwrap());

        let result = build(&original);
        assert_eq!(result.get("x-real-ip").unwrap(), "1.2.3.4");
    }

    #[test]
    fn sets_correlation_id_and_via() {
        let result = build(&HeaderMap::new());
        assert_eq!(result.get("x-correlation-id").unwrap(), "test-id");
        assert_eq!(result.get("via").unwrap(), "1.1 edgeip");
        assert_eq!(result.get("x-forwarded-proto").unwrap(), "http");
    }

    #[test]
    fn proxy_headers_can_be_disabled() {
        let defaults = Defaults {
            proxy_headers: false,
            ..Defaults::default()
        };
        let result =
            build_forwarded_headers(&HeaderMap::new(), "10.0.0.1", &target(), &defaults, "id");

        assert!(result.get("x-forwarded-for").is_none());
        assert!(result.get("via").is_none());
        assert_eq!(result.get("host").unwrap(), "backend:9090");
    }

    #[test]
    fn strip_response_removes_length() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", "12".parse().unwrap());
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        headers.insert("content-type", "text/plain".parse().unwrap());

        strip_response_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
    }
}
