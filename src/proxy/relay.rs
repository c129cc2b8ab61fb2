//! Copying the upstream response back to the caller.
//!
//! Status and body are relayed verbatim. Upstream headers stay behind
//! unless `relay_headers` is set, in which case they are copied minus
//! hop-by-hop headers and `content-length`.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::sanitize::strip_response_hop_by_hop;
use super::upstream::UpstreamResponse;

#[must_use]
pub fn into_response(upstream: UpstreamResponse, relay_headers: bool) -> Response {
    let UpstreamResponse {
        status,
        mut headers,
        body,
    } = upstream;

    let mut builder = Response::builder().status(status);
    if relay_headers {
        strip_response_hop_by_hop(&mut headers);
        for (key, value) in &headers {
            builder = builder.header(key, value);
        }
    }

    builder.body(Body::from(body)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build response");
        StatusCode::BAD_GATEWAY.into_response()
    })
}
