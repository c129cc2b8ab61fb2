//! `urlrelay run` — start the proxy server.
//!
//! Builds the forwarding settings from the CLI, starts the Axum HTTP
//! server, and waits for SIGTERM / Ctrl+C to shut down gracefully.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::ForwardSettings;
use crate::error::RelayError;
use crate::logging;
use crate::proxy::upstream::HyperUpstream;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let settings = ForwardSettings::from_args(&args)?;
    let client = HyperUpstream::new(server::build_http_client(), settings.timeout);

    tracing::debug!(
        url_param = %settings.url_param,
        relay_response_headers = settings.relay_response_headers,
        strip_hop_by_hop = settings.policy.strip_hop_by_hop,
        timeout_ms = ?settings.timeout_ms(),
        "forwarding settings"
    );

    let state = Arc::new(AppState::new(Arc::new(client), settings));
    let router = server::build_router(state, args.max_body);

    let addr = listen_addr(&args)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "urlrelay started");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("urlrelay stopped");
    Ok(())
}

/// `--host` is an IP literal, v4 or v6 (`::` listens on every interface).
fn listen_addr(args: &RunArgs) -> Result<SocketAddr, RelayError> {
    let ip: IpAddr = args.host.trim().parse()?;
    Ok(SocketAddr::new(ip, args.port))
}
