//! Mutual TLS configuration and certificate generation.
//!
//! # Flow
//!
//! ```text
//! YAML / env / CLI
//!   → TlsConfig        (paths, Level, SANs)
//!   → build_tls_config (load PEM files, CA pool, Level → ClientAuth)
//!   → ResolvedTls      (fixed versions, suites, curves)
//!   → rustls ServerConfig / ClientConfig
//! ```
//!
//! # Modules
//!
//! - [`level`] - client-auth `Level` and its mnemonics
//! - [`config`] - the `TlsConfig` value object
//! - [`builder`] - resolution into rustls configs
//! - [`identity`] - SAN extraction from peer certificates
//! - [`generate`] - CA and leaf certificate generation
//!
//! # Quick start
//!
//! ```yaml
//! tls:
//!   cert:  "/etc/svc/tls/server.crt"
//!   key:   "/etc/svc/tls/server.key"
//!   ca:    "/etc/svc/tls/ca.crt"
//!   level: hard
//! ```

pub mod builder;
pub mod config;
pub mod generate;
pub mod identity;
pub mod level;

pub use builder::{
    ClientAuth, DEFAULT_CIPHER_SUITES, DEFAULT_CURVES, MAX_VERSION, MIN_VERSION, ResolvedTls,
    build_tls_config,
};
pub use config::TlsConfig;
pub use generate::{CertificateAuthority, Subject, make_ca, make_cert};
pub use identity::CertIdentity;
pub use level::Level;
