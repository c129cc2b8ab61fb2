//! Outbound header sanitization.
//!
//! [`sanitize`] copies the inbound headers into a fresh map, dropping
//! browser/session context that must not leak upstream: a fixed
//! exclusion list, every `Sec-*` header, `Content-Length` on GET, and
//! (by default) hop-by-hop headers. Names are compared
//! case-insensitively; `http` already lowercases parsed names, and the
//! comparisons below do not rely on it.

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};

/// Headers never forwarded, whatever their value.
pub const EXCLUDED: &[&str] = &[
    "referer",
    "cookie",
    "upgrade-insecure-requests",
    "accept-encoding",
    "cache-control",
    "mod-rewrite",
    "host",
];

const SEC_PREFIX: &str = "sec-";

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

#[derive(Debug, Clone)]
pub struct SanitizePolicy {
    pub strip_hop_by_hop: bool,
    /// Replaces any inbound `Content-Type` when set.
    pub content_type: Option<HeaderValue>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            strip_hop_by_hop: true,
            content_type: None,
        }
    }
}

#[must_use]
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Any name in the `Sec-` namespace: fetch metadata, client hints and
/// WebSocket handshake headers alike.
#[must_use]
pub fn is_sec_prefixed(name: &str) -> bool {
    name.get(..SEC_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SEC_PREFIX))
}

#[must_use]
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Strip hop-by-hop headers and `content-length` from a collected response.
///
/// The body has been fully read, so the origin's framing headers no longer
/// describe what we send back. Axum sets `content-length` from the bytes.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(header::CONTENT_LENGTH);
}

#[must_use]
pub fn sanitize(method: &Method, inbound: &HeaderMap, policy: &SanitizePolicy) -> HeaderMap {
    let drop_content_length = method == Method::GET;

    let mut outbound = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        let key = name.as_str();
        if is_excluded(key) || is_sec_prefixed(key) {
            continue;
        }
        if drop_content_length && name == header::CONTENT_LENGTH {
            continue;
        }
        if policy.strip_hop_by_hop && is_hop_by_hop(name) {
            continue;
        }
        // append keeps every value of a repeated header
        outbound.append(name.clone(), value.clone());
    }

    if let Some(content_type) = &policy.content_type {
        outbound.insert(header::CONTENT_TYPE, content_type.clone());
    }

    outbound
}
