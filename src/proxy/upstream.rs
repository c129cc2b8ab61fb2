//! Upstream call: one request out, one fully collected response back.
//!
//! [`UpstreamClient`] is the seam between the forwarder and the transport.
//! [`HyperUpstream`] is the production implementation over the pooled
//! hyper-util client; tests substitute their own. Redirects are followed
//! by tower-http's `FollowRedirect`, so callers see the final response.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use tower::ServiceExt;
use tower_http::follow_redirect::policy::{Action, Attempt, Policy, Standard};
use tower_http::follow_redirect::FollowRedirect;

use crate::error::ForwardError;
use crate::server::HttpClient;

use super::request::OutboundRequest;

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

// async_trait is required here because the client is stored as
// Arc<dyn UpstreamClient> in AppState.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Perform exactly one call. Implementations must not retry.
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ForwardError>;
}

/// [`Standard`] redirect handling (20 hops, credentials dropped across
/// origins) that also replays the buffered body on 307 and 308.
#[derive(Debug, Clone, Default)]
pub struct RedirectPolicy(Standard);

impl<E> Policy<Full<Bytes>, E> for RedirectPolicy {
    fn redirect(&mut self, attempt: &Attempt<'_>) -> Result<Action, E> {
        Policy::<Full<Bytes>, E>::redirect(&mut self.0, attempt)
    }

    fn on_request(&mut self, request: &mut hyper::Request<Full<Bytes>>) {
        Policy::<Full<Bytes>, E>::on_request(&mut self.0, request);
    }

    fn clone_body(&self, body: &Full<Bytes>) -> Option<Full<Bytes>> {
        Some(body.clone())
    }
}

#[derive(Clone)]
pub struct HyperUpstream {
    client: FollowRedirect<HttpClient, RedirectPolicy>,
    timeout: Option<Duration>,
}

impl HyperUpstream {
    #[must_use]
    pub fn new(client: HttpClient, timeout: Option<Duration>) -> Self {
        Self {
            client: FollowRedirect::with_policy(client, RedirectPolicy::default()),
            timeout,
        }
    }

    async fn call(&self, req: hyper::Request<Full<Bytes>>) -> Result<UpstreamResponse, ForwardError> {
        let response = self
            .client
            .clone()
            .oneshot(req)
            .await
            .map_err(ForwardError::upstream)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ForwardError::upstream(format!("body read error: {e}")))?
            .to_bytes();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl UpstreamClient for HyperUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ForwardError> {
        let mut req_builder = hyper::Request::builder()
            .method(request.method)
            .uri(request.url.as_str());

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        let req = req_builder
            .body(Full::new(request.body.unwrap_or_default()))
            .map_err(|e| ForwardError::invalid_target(e.to_string()))?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.call(req))
                .await
                .map_err(|_| {
                    ForwardError::upstream(format!(
                        "request timed out after {}ms",
                        limit.as_millis()
                    ))
                })?,
            None => self.call(req).await,
        }
    }
}
