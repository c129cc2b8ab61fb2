//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding settings, the
//! upstream client, stats, and uptime), [`build_router`] for constructing
//! the Axum router with middleware layers, [`build_http_client`] for the
//! connection-pooled hyper client, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::ForwardSettings;
use crate::health::health_handler;
use crate::proxy::{self, UpstreamClient};

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    /// Upstream unreachable.
    pub failed: AtomicU64,
    /// Invalid target or unsupported method.
    pub rejected: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub client: Arc<dyn UpstreamClient>,
    pub settings: ForwardSettings,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(client: Arc<dyn UpstreamClient>, settings: ForwardSettings) -> Self {
        Self {
            client,
            settings,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pooled client for http and https targets.
///
/// Canceled requests are never resent on another pooled connection, so each
/// forward reaches the upstream at most once per redirect hop.
#[must_use]
pub fn build_http_client() -> HttpClient {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .retry_canceled_requests(false)
        .build(connector)
}

/// `/health` is answered locally; every other path is forwarded.
///
/// `max_body` is the single cap on inbound bodies: axum's own extractor
/// limit is switched off so it cannot undercut the configured value.
pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body));

    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy::forward_handler)
        .layer(middleware)
        .with_state(state)
}

/// Resolves once Ctrl+C or SIGTERM arrives.
pub async fn shutdown_signal() {
    let signal = tokio::select! {
        () = ctrl_c() => "ctrl_c",
        () = terminate() => "sigterm",
    };
    tracing::info!(signal, "shutdown requested, draining connections");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
