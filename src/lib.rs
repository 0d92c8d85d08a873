//! mtls-kit
//!
//! Test helpers for HTTP services, plus a small mutual-TLS core.
//!
//! # Features
//!
//! - **Assertions**: coloured have/want checks behind a pluggable [`assert::Reporter`]
//! - **Web checks**: status, body and header assertions on live HTTP calls
//! - **Suites**: declarative endpoint test cases
//! - **mTLS**: client-auth levels, rustls config resolution, CA / leaf generation
//! - **Utilities**: free TCP ports, JSON re-indentation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assert;
pub mod cli;
pub mod config;
pub mod error;
pub mod mtls;
pub mod port;
pub mod pretty;
pub mod suite;
pub mod web;

pub use error::{Error, ErrorKind, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let res = match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    res.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
