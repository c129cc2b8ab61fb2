//! `urlrelay health` — check the health of a running instance.
//!
//! Sends a `GET /health` request (http or https) to the specified URL
//! and displays the response as formatted text or raw JSON.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::cli::HealthArgs;
use crate::error::RelayError;
use crate::health::HealthResponse;
use crate::server;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

fn http_error(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> RelayError {
    RelayError::HttpRequest {
        source: source.into(),
    }
}

async fn fetch(uri: hyper::Uri) -> Result<(hyper::StatusCode, Bytes), RelayError> {
    let req = hyper::Request::builder()
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .map_err(http_error)?;

    let client = server::build_http_client();
    let response = tokio::time::timeout(PROBE_TIMEOUT, client.request(req))
        .await
        .map_err(|_| {
            http_error(format!(
                "health check timed out after {}s",
                PROBE_TIMEOUT.as_secs()
            ))
        })?
        .map_err(http_error)?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(http_error)?
        .to_bytes();
    Ok((status, body))
}

pub async fn execute(args: HealthArgs) -> Result<(), RelayError> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let uri: hyper::Uri = url.parse().map_err(|e: hyper::http::uri::InvalidUri| {
        RelayError::UriParse {
            source: Box::new(e),
        }
    })?;

    let (status, body) = fetch(uri).await?;
    if !status.is_success() {
        return Err(RelayError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    let body_str = String::from_utf8_lossy(&body);
    match serde_json::from_str::<HealthResponse>(&body_str) {
        Ok(health) => {
            let uptime = format_uptime(health.uptime_seconds);
            let timeout = health
                .settings
                .timeout_ms
                .map_or_else(|| "none".to_string(), |ms| format!("{ms}ms"));
            println!("\u{2713} urlrelay is healthy ({})", args.url);
            println!("  version:   {}", health.version);
            println!("  uptime:    {uptime}");
            println!("  target:    ?{}=<url>", health.settings.url_param);
            println!("  timeout:   {timeout}");
            println!(
                "  requests:  {} forwarded, {} failed, {} rejected",
                health.stats.requests_forwarded,
                health.stats.requests_failed,
                health.stats.requests_rejected
            );
        }
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{body_str}");
        }
    }

    Ok(())
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formats_by_magnitude() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3_725), "1h 2m 5s");
    }
}
