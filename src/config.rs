//! Runtime settings for the forwarder.
//!
//! [`ForwardSettings`] is built once from the `run` arguments and shared
//! read-only with every request through [`AppState`](crate::server::AppState).
//! There is no config file: every knob is a CLI flag with an environment
//! variable equivalent.

use std::time::Duration;

use axum::http::HeaderValue;

use crate::cli::RunArgs;
use crate::error::RelayError;
use crate::proxy::sanitize::SanitizePolicy;

pub const DEFAULT_URL_PARAM: &str = "url";

#[derive(Debug, Clone)]
pub struct ForwardSettings {
    /// Query parameter carrying the forwarding target.
    pub url_param: String,
    pub policy: SanitizePolicy,
    pub relay_response_headers: bool,
    /// `None` leaves the upstream call unbounded.
    pub timeout: Option<Duration>,
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            url_param: DEFAULT_URL_PARAM.to_string(),
            policy: SanitizePolicy::default(),
            relay_response_headers: false,
            timeout: None,
        }
    }
}

impl ForwardSettings {
    pub fn from_args(args: &RunArgs) -> Result<Self, RelayError> {
        let url_param = args.url_param.trim();
        if url_param.is_empty() {
            return Err(RelayError::InvalidSetting {
                flag: "url-param",
                message: "parameter name cannot be empty".into(),
            });
        }

        let content_type = args
            .content_type
            .as_deref()
            .map(parse_content_type)
            .transpose()?;

        let timeout = match args.timeout {
            Some(0) => {
                return Err(RelayError::InvalidSetting {
                    flag: "timeout",
                    message: "must be greater than 0 (omit the flag to disable)".into(),
                })
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        Ok(Self {
            url_param: url_param.to_string(),
            policy: SanitizePolicy {
                strip_hop_by_hop: !args.keep_hop_by_hop,
                content_type,
            },
            relay_response_headers: args.relay_response_headers,
            timeout,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout.map(|t| t.as_millis() as u64)
    }
}

fn parse_content_type(value: &str) -> Result<HeaderValue, RelayError> {
    HeaderValue::from_str(value.trim()).map_err(|e| RelayError::InvalidSetting {
        flag: "content-type",
        message: format!("'{value}' is not a valid header value ({e})"),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["urlrelay", "run"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Some(Commands::Run(args)) => *args,
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn defaults_leave_optional_behavior_off() {
        let settings = ForwardSettings::from_args(&run_args(&[])).unwrap();
        assert_eq!(settings.url_param, "url");
        assert!(settings.policy.strip_hop_by_hop);
        assert!(settings.policy.content_type.is_none());
        assert!(!settings.relay_response_headers);
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn accepts_overrides() {
        let settings = ForwardSettings::from_args(&run_args(&[
            "--url-param",
            "target",
            "--content-type",
            "application/json",
            "--timeout",
            "2500",
            "--relay-response-headers",
            "--keep-hop-by-hop",
        ]))
        .unwrap();
        assert_eq!(settings.url_param, "target");
        assert_eq!(settings.policy.content_type.as_ref().unwrap(), "application/json");
        assert_eq!(settings.timeout_ms(), Some(2500));
        assert!(settings.relay_response_headers);
        assert!(!settings.policy.strip_hop_by_hop);
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ForwardSettings::from_args(&run_args(&["--timeout", "0"])).unwrap_err();
        assert!(err.to_string().contains("--timeout"));
    }

    #[test]
    fn rejects_invalid_content_type() {
        let args = run_args(&["--content-type", "text/plain\u{7f}"]);
        let err = ForwardSettings::from_args(&args).unwrap_err();
        assert!(err.to_string().contains("--content-type"));
    }

    #[test]
    fn rejects_blank_url_param() {
        let err = ForwardSettings::from_args(&run_args(&["--url-param", "  "])).unwrap_err();
        assert!(err.to_string().contains("--url-param"));
    }
}
