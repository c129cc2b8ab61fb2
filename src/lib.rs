//! urlrelay is a minimal HTTP forwarding proxy.
//!
//! It accepts any request carrying a `?url=<absolute URL>` query parameter,
//! strips browser and session headers that must not leak upstream, forwards
//! the request to that URL, and relays the upstream status code and body
//! back to the caller.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, health).
//! - [`config`] -- Forwarding settings derived from CLI flags.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- The forwarder: header sanitization, request building, the
//!   upstream call, and response relay.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Forwarding rules
//!
//! | Inbound | Outbound |
//! |---------|----------|
//! | `GET` | no body, `Content-Length` dropped |
//! | `POST` | body forwarded byte-for-byte |
//! | any other method | rejected with 405 |
//! | `Referer`, `Cookie`, `Host`, `Sec-*`, ... | never forwarded |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;
