//! Core HTTP request forwarding.
//!
//! [`forward_handler`] is the Axum fallback that receives every
//! non-`/health` request, turns it into an [`InboundRequest`] and hands it
//! to [`forward`]. Submodules handle header sanitization ([`sanitize`]),
//! request building ([`request`]), the upstream call ([`upstream`]) and
//! response relay ([`relay`]).

pub mod relay;
pub mod request;
pub mod sanitize;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::config::ForwardSettings;
use crate::error::ForwardError;
use crate::server::AppState;

pub use request::{InboundRequest, OutboundRequest};
pub use upstream::{UpstreamClient, UpstreamResponse};

/// Forward one inbound request and return the collected upstream response.
///
/// Validation errors surface before any network call. Upstream failures
/// propagate as-is; nothing is retried.
pub async fn forward(
    client: &dyn UpstreamClient,
    settings: &ForwardSettings,
    inbound: InboundRequest,
) -> Result<UpstreamResponse, ForwardError> {
    let headers = sanitize::sanitize(&inbound.method, &inbound.headers, &settings.policy);

    tracing::info!(
        url = inbound.target.as_deref().unwrap_or_default(),
        method = %inbound.method,
        headers = ?headers,
        "request received"
    );
    if inbound.method == Method::POST {
        log_form_fields(&inbound.headers, &inbound.body);
    }

    let outbound = request::build_outbound(inbound, headers)?;
    let response = client.send(outbound).await?;

    tracing::debug!(
        status = response.status.as_u16(),
        headers = ?response.headers,
        "upstream responded"
    );

    Ok(response)
}

/// Log urlencoded form fields of a POST body at debug level.
fn log_form_fields(headers: &HeaderMap, body: &Bytes) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        });

    let fields: Vec<(String, String)> = if is_form {
        url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    } else {
        Vec::new()
    };
    tracing::debug!(fields = ?fields, body_bytes = body.len(), "POST");
}

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = req_headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let span = tracing::info_span!(
        "forward",
        correlation_id = %correlation_id,
        client = %addr.ip(),
    );

    let inbound = InboundRequest {
        method,
        target: request::target_from_query(uri.query(), &state.settings.url_param),
        headers: req_headers,
        body,
    };

    async move {
        match forward(state.client.as_ref(), &state.settings, inbound).await {
            Ok(upstream) => {
                state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                relay::into_response(upstream, state.settings.relay_response_headers)
            }
            Err(e @ ForwardError::UpstreamUnavailable { .. }) => {
                tracing::error!(error = %e, "upstream call failed");
                state.stats.failed.fetch_add(1, Ordering::Relaxed);
                e.into_response()
            }
            Err(e) => {
                tracing::warn!(error = %e, "request rejected");
                state.stats.rejected.fetch_add(1, Ordering::Relaxed);
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
