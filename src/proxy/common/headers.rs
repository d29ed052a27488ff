// Header rewriting between caller and upstream

use axum::http::{header, HeaderMap, HeaderValue};

use super::csrf::inject_csrf_headers;
use crate::proxy::config::ProxyConfig;

/// Inbound headers never forwarded upstream.
///
/// `host`, `origin`, `referer` and `connection` belong to the caller's hop;
/// the rest are framing headers the outbound client recomputes.
pub const REQUEST_HEADER_DENYLIST: &[&str] = &[
    "host",
    "origin",
    "referer",
    "connection",
    "content-length",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "accept-encoding",
    "proxy-connection",
    "te",
    "trailer",
];

/// Upstream headers that become wrong once the body is re-framed.
pub const RESPONSE_HEADER_DENYLIST: &[&str] = &[
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
];

fn is_denied(name: &str, denylist: &[&str]) -> bool {
    // `HeaderName` is always lower-case, still compare loosely
    denylist.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Build the outbound header set for one relayed request
pub fn forward_request_headers(
    inbound: &HeaderMap,
    config: &ProxyConfig,
    upstream_origin: &str,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 3);

    for (name, value) in inbound.iter() {
        if !is_denied(name.as_str(), REQUEST_HEADER_DENYLIST) {
            outbound.append(name.clone(), value.clone());
        }
    }

    inject_csrf_headers(
        inbound,
        &mut outbound,
        &config.csrf_cookie_names,
        &config.csrf_header_names,
    );

    let credentialed =
        inbound.contains_key(header::COOKIE) || inbound.contains_key(header::AUTHORIZATION);
    if config.forward_upstream_origin && credentialed {
        if let Ok(origin) = HeaderValue::from_str(upstream_origin) {
            outbound.insert(header::ORIGIN, origin);
        }
    }

    outbound
}

/// Build the caller-facing header set from an upstream response
pub fn relay_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if !is_denied(name.as_str(), RESPONSE_HEADER_DENYLIST) {
            relayed.append(name.clone(), value.clone());
        }
    }
    relayed
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM_ORIGIN: &str = "http://backend.internal:8080";

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        headers.insert(header::ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        headers.insert(header::REFERER, HeaderValue::from_static("http://localhost:3000/dashboard"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("7"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-tenant", HeaderValue::from_static("hq"));
        headers
    }

    #[test]
    fn test_connection_specific_headers_dropped() {
        let outbound = forward_request_headers(&inbound(), &ProxyConfig::default(), UPSTREAM_ORIGIN);

        for name in ["host", "origin", "referer", "connection", "content-length"] {
            assert!(!outbound.contains_key(name), "{} leaked upstream", name);
        }
        assert_eq!(outbound.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(outbound.get("x-tenant").unwrap(), "hq");
    }

    #[test]
    fn test_credentialed_request_gets_upstream_origin() {
        let mut headers = inbound();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));

        let outbound = forward_request_headers(&headers, &ProxyConfig::default(), UPSTREAM_ORIGIN);
        assert_eq!(outbound.get(header::ORIGIN).unwrap(), UPSTREAM_ORIGIN);
        assert_eq!(outbound.get(header::AUTHORIZATION).unwrap(), "Bearer t0k");

        let config = ProxyConfig {
            forward_upstream_origin: false,
            ..Default::default()
        };
        let outbound = forward_request_headers(&headers, &config, UPSTREAM_ORIGIN);
        assert!(!outbound.contains_key(header::ORIGIN));
    }

    #[test]
    fn test_multi_value_headers_preserved() {
        let mut headers = HeaderMap::new();
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));

        let outbound = forward_request_headers(&headers, &ProxyConfig::default(), UPSTREAM_ORIGIN);
        let values: Vec<_> = outbound.get_all("x-trace").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_reframed_response_headers_dropped() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("120"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let relayed = relay_response_headers(&upstream);
        assert!(!relayed.contains_key(header::CONTENT_ENCODING));
        assert!(!relayed.contains_key(header::CONTENT_LENGTH));
        assert!(!relayed.contains_key(header::TRANSFER_ENCODING));
        assert_eq!(relayed.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_set_cookie_always_relayed() {
        let mut upstream = HeaderMap::new();
        upstream.append(
            header::SET_COOKIE,
            HeaderValue::from_static("session=s1; Path=/; HttpOnly"),
        );
        upstream.append(
            header::SET_COOKIE,
            HeaderValue::from_static("XSRF-TOKEN=abc123; Path=/"),
        );

        let relayed = relay_response_headers(&upstream);
        let cookies: Vec<_> = relayed.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(
            cookies,
            vec!["session=s1; Path=/; HttpOnly", "XSRF-TOKEN=abc123; Path=/"]
        );
    }
}
