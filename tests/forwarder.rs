//! Integration tests for the forwarder against in-process upstream clients.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use urlrelay::config::ForwardSettings;
use urlrelay::error::ForwardError;
use urlrelay::proxy::{
    forward, InboundRequest, OutboundRequest, UpstreamClient, UpstreamResponse,
};

/// Records every outbound request and answers with a canned response.
struct RecordingClient {
    status: StatusCode,
    body: &'static [u8],
    seen: Mutex<Vec<OutboundRequest>>,
}

impl RecordingClient {
    fn new(status: u16, body: &'static [u8]) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for RecordingClient {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ForwardError> {
        self.seen.lock().unwrap().push(request);
        Ok(UpstreamResponse {
            status: self.status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(self.body),
        })
    }
}

/// Fails every call like a refused connection.
#[derive(Default)]
struct RefusingClient {
    attempts: AtomicUsize,
}

#[async_trait]
impl UpstreamClient for RefusingClient {
    async fn send(&self, _request: OutboundRequest) -> Result<UpstreamResponse, ForwardError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ForwardError::upstream(std::io::Error::from(
            std::io::ErrorKind::ConnectionRefused,
        )))
    }
}

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(
            name.parse::<HeaderName>().unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

fn inbound(
    method: Method,
    target: Option<&str>,
    pairs: &[(&str, &str)],
    body: &'static [u8],
) -> InboundRequest {
    InboundRequest {
        method,
        target: target.map(String::from),
        headers: headers(pairs),
        body: Bytes::from_static(body),
    }
}

#[tokio::test]
async fn get_forwards_only_safe_headers() {
    let client = RecordingClient::new(200, b"ok");
    let request = inbound(
        Method::GET,
        Some("http://upstream.test/resource"),
        &[("Cookie", "a=b"), ("Accept-Encoding", "gzip"), ("X-Custom", "1")],
        b"",
    );

    let response = forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"ok"));

    let sent = client.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::GET);
    assert_eq!(sent[0].url.as_str(), "http://upstream.test/resource");
    assert_eq!(sent[0].headers, headers(&[("X-Custom", "1")]));
    assert!(sent[0].body.is_none());
}

#[tokio::test]
async fn post_forwards_json_body_verbatim() {
    let client = RecordingClient::new(201, b"{\"id\":5}");
    let request = inbound(
        Method::POST,
        Some("http://upstream.test/items"),
        &[("Content-Type", "application/json")],
        b"{\"k\":1}",
    );

    let response = forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, Bytes::from_static(b"{\"id\":5}"));

    let sent = client.sent();
    assert_eq!(sent[0].body, Some(Bytes::from_static(b"{\"k\":1}")));
    assert_eq!(sent[0].headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn sec_prefixed_headers_never_reach_upstream() {
    let client = RecordingClient::new(200, b"");
    let request = inbound(
        Method::GET,
        Some("http://upstream.test/"),
        &[("Sec-Fetch-Mode", "navigate"), ("SEC-CH-UA-MOBILE", "?0")],
        b"",
    );

    forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap();

    assert!(client.sent()[0].headers.is_empty());
}

#[tokio::test]
async fn get_drops_stale_content_length() {
    let client = RecordingClient::new(200, b"");
    let request = inbound(
        Method::GET,
        Some("http://upstream.test/"),
        &[("Content-Length", "42")],
        b"",
    );

    forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap();

    assert!(client.sent()[0].headers.get("content-length").is_none());
}

#[tokio::test]
async fn missing_target_fails_before_any_call() {
    let client = RecordingClient::new(200, b"");
    let request = inbound(Method::GET, None, &[], b"");

    let err = forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::InvalidTarget { .. }));
    assert!(client.sent().is_empty());
}

#[tokio::test]
async fn unsupported_method_fails_before_any_call() {
    let client = RecordingClient::new(200, b"");
    let request = inbound(Method::PUT, Some("http://upstream.test/"), &[], b"x");

    let err = forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::UnsupportedMethod(ref m) if m == Method::PUT));
    assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(client.sent().is_empty());
}

#[tokio::test]
async fn refused_connection_is_attempted_once() {
    let client = RefusingClient::default();
    let request = inbound(Method::GET, Some("http://127.0.0.1:9/"), &[], b"");

    let err = forward(&client, &ForwardSettings::default(), request)
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::UpstreamUnavailable { .. }));
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(client.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn content_type_override_applies_to_post() {
    let client = RecordingClient::new(200, b"");
    let mut settings = ForwardSettings::default();
    settings.policy.content_type = Some(HeaderValue::from_static("application/json"));

    let request = inbound(
        Method::POST,
        Some("http://upstream.test/"),
        &[("Content-Type", "text/plain")],
        b"{}",
    );
    forward(&client, &settings, request).await.unwrap();

    assert_eq!(
        client.sent()[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}
