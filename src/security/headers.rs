//! Header sanitation for forwarded traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop the client's `Host` so the upstream sees its own authority
//!
//! # Design Decisions
//! - Headers named in `Connection` are treated as hop-by-hop too
//! - No `X-Forwarded-*` headers are added

use axum::http::{header, HeaderMap, HeaderName};

/// Headers that only apply to a single transport hop.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Prepare client request headers for the upstream.
pub fn upstream_request_headers(client: &HeaderMap) -> HeaderMap {
    let mut headers = client.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers
}
