//! Error types for mtls-kit

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for mtls-kit
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid textual input (level mnemonic, IP literal, JSON)
    Parse,
    /// Missing or unreadable file, socket failure
    Io,
    /// Key generation, certificate construction, TLS assembly
    Crypto,
    /// Inconsistent or unloadable configuration
    Config,
    /// HTTP transport failure
    Http,
}

/// mtls-kit errors
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown TLS authentication level mnemonic
    #[error("Invalid TLS level {0:?} (expected one of none, request, any, hard, hardAndSAN)")]
    InvalidLevel(String),

    /// Stored level value outside the known range
    #[error("Unknown TLS level value {0}")]
    LevelMapping(u64),

    /// Invalid IP literal
    #[error("Invalid IP address {input:?}: {source}")]
    InvalidIp {
        /// Offending input
        input: String,
        /// Parser error
        #[source]
        source: std::net::AddrParseError,
    },

    /// File could not be read
    #[error("Cannot read '{}': {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// File could not be written
    #[error("Cannot write '{}': {source}", path.display())]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Certificate / key pair could not be loaded
    #[error("Certificate load error: {0}")]
    CertLoad(String),

    /// CA bundle could not be loaded
    #[error("CA load error: {0}")]
    CaLoad(String),

    /// Key generation or certificate construction failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// rustls error
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLevel(_)
            | Self::LevelMapping(_)
            | Self::InvalidIp { .. }
            | Self::Json(_) => ErrorKind::Parse,
            Self::Read { .. } | Self::Write { .. } | Self::Io(_) => ErrorKind::Io,
            Self::CertLoad(_) | Self::CaLoad(_) | Self::Crypto(_) | Self::Tls(_) => {
                ErrorKind::Crypto
            }
            Self::Config(_) => ErrorKind::Config,
            Self::Http(_) => ErrorKind::Http,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
