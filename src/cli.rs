//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::mtls::Level;

/// Test helpers for HTTP services: mTLS certificates, free ports, JSON
#[derive(Parser, Debug)]
#[command(name = "mtls-kit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "MTLS_KIT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "MTLS_KIT_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json); overrides the config file
    #[arg(long, env = "MTLS_KIT_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// TLS certificate and configuration commands
    #[command(subcommand)]
    Tls(TlsCommand),

    /// Print a free TCP port
    Port {
        /// Address to probe (default: 127.0.0.1)
        #[arg(long)]
        ip: Option<String>,
    },

    /// Re-indent a JSON document
    Pretty {
        /// Input file (default: stdin)
        file: Option<PathBuf>,

        /// Emit compact JSON instead of indented
        #[arg(long)]
        compact: bool,
    },
}

/// TLS subcommands
#[derive(Subcommand, Debug)]
pub enum TlsCommand {
    /// Generate a self-signed CA (`ca.crt`, `ca.key`)
    InitCa {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Certificate subject
        #[command(flatten)]
        subject: SubjectArgs,
    },

    /// Issue a leaf certificate signed by an existing CA
    Issue {
        /// CA certificate (PEM)
        #[arg(long, default_value = "ca.crt")]
        ca_cert: PathBuf,

        /// CA private key (PEM)
        #[arg(long, default_value = "ca.key")]
        ca_key: PathBuf,

        /// Base name of the output files (`<name>.crt`, `<name>.key`)
        #[arg(short, long)]
        name: String,

        /// Extra IP SAN, next to localhost / 127.0.0.1 / ::1
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Certificate subject
        #[command(flatten)]
        subject: SubjectArgs,
    },

    /// Resolve the configured TLS settings and print a summary
    Check {
        /// Certificate chain (PEM); overrides the config file
        #[arg(long)]
        cert: Option<String>,

        /// Private key (PEM); overrides the config file
        #[arg(long)]
        key: Option<String>,

        /// CA bundle (PEM); overrides the config file
        #[arg(long)]
        ca: Option<String>,

        /// Client auth level (none, request, any, hard, hardAndSAN)
        #[arg(long)]
        level: Option<Level>,

        /// Accepted client SAN (repeatable)
        #[arg(long = "san")]
        sans: Vec<String>,
    },
}

/// Certificate subject fields
#[derive(Args, Debug, Clone)]
pub struct SubjectArgs {
    /// Common Name
    #[arg(long)]
    pub cn: Option<String>,

    /// Organization
    #[arg(long)]
    pub org: Option<String>,

    /// Organizational unit
    #[arg(long)]
    pub ou: Option<String>,
}
