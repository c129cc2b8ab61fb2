//! Inbound/outbound request values and method-specific request building.
//!
//! [`InboundRequest`] is what the server hands the forwarder;
//! [`build_outbound`] validates it and produces the [`OutboundRequest`]
//! that is submitted upstream. Validation happens before any network use.

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use crate::error::ForwardError;

#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Raw value of the target query parameter, if supplied.
    pub target: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for GET; the verbatim inbound body for POST.
    pub body: Option<Bytes>,
}

/// Extract the decoded value of `param` from a raw query string.
///
/// The last occurrence wins when the parameter repeats. An empty value is
/// treated as absent.
#[must_use]
pub fn target_from_query(query: Option<&str>, param: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .filter(|(key, _)| key == param)
        .last()
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

pub fn parse_target(target: Option<&str>) -> Result<Url, ForwardError> {
    let raw = target
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ForwardError::invalid_target("no target URL supplied"))?;

    let url = Url::parse(raw)
        .map_err(|e| ForwardError::invalid_target(format!("'{raw}' is not a valid URL ({e})")))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ForwardError::invalid_target(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ForwardError::invalid_target(format!("'{raw}' has no host")));
    }

    Ok(url)
}

/// Build the outbound request from an inbound one and its sanitized headers.
pub fn build_outbound(
    inbound: InboundRequest,
    headers: HeaderMap,
) -> Result<OutboundRequest, ForwardError> {
    let body = match inbound.method {
        Method::GET => None,
        Method::POST => Some(inbound.body),
        other => return Err(ForwardError::UnsupportedMethod(other)),
    };

    let url = parse_target(inbound.target.as_deref())?;

    Ok(OutboundRequest {
        method: inbound.method,
        url,
        headers,
        body,
    })
}
