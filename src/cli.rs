//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, health), and their associated argument structs.
//! Every `run` flag has an environment variable equivalent for container
//! deployments.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "urlrelay",
    version,
    about = "Minimal HTTP forwarding proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        urlrelay run                         Listen on 0.0.0.0:3000\n  \
        curl 'localhost:3000/?url=https%3A%2F%2Fexample.com%2F'\n  \
        urlrelay health                      Probe a running instance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        urlrelay run                                  Defaults\n  \
        urlrelay run -p 8080 --pretty -l debug        Local dev mode\n  \
        urlrelay run --url-param target               Read the target from ?target=\n  \
        urlrelay run --relay-response-headers         Also copy upstream headers")]
pub struct RunArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Forwarding --
    /// Query parameter holding the target URL
    #[arg(
        long,
        env = "URL_PARAM",
        default_value = crate::config::DEFAULT_URL_PARAM,
        help_heading = "Forwarding"
    )]
    pub url_param: String,

    /// Overwrite the outbound Content-Type with this value
    #[arg(long, env = "FORCE_CONTENT_TYPE", help_heading = "Forwarding")]
    pub content_type: Option<String>,

    /// Copy upstream response headers back to the caller (hop-by-hop stripped)
    #[arg(long, env = "RELAY_RESPONSE_HEADERS", help_heading = "Forwarding")]
    pub relay_response_headers: bool,

    /// Forward Connection, Transfer-Encoding and other hop-by-hop headers
    #[arg(long, help_heading = "Forwarding")]
    pub keep_hop_by_hop: bool,

    // -- Tuning --
    /// Upstream timeout in milliseconds (unbounded when omitted)
    #[arg(long, env = "REQUEST_TIMEOUT_MS", help_heading = "Tuning")]
    pub timeout: Option<u64>,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pretty_and_json_conflict() {
        let result = Cli::try_parse_from(["urlrelay", "run", "--pretty", "--json"]);
        assert!(result.is_err());
    }

    #[test]
    fn health_defaults_to_localhost() {
        let cli = Cli::parse_from(["urlrelay", "health"]);
        match cli.command {
            Some(Commands::Health(args)) => {
                assert_eq!(args.url, "http://localhost:3000");
                assert!(!args.json);
            }
            _ => panic!("expected health subcommand"),
        }
    }
}
