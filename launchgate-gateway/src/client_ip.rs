use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Proxy headers consulted in priority order before falling back to the peer.
const SINGLE_VALUE_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "true-client-ip",
    "x-real-ip",
    "x-client-ip",
];

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolves the address reported for a request.
///
/// With `trust_proxy_headers` the first non-empty proxy header wins, then the
/// first entry of `X-Forwarded-For`. Otherwise, or when none is present, the
/// socket peer is used. Returns an empty string when nothing is known.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        if let Some(ip) = from_headers(headers) {
            return ip;
        }
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn from_headers(headers: &HeaderMap) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    for name in SINGLE_VALUE_HEADERS {
        if let Some(value) = header_value(name) {
            return Some(value.to_string());
        }
    }

    header_value(FORWARDED_FOR)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
