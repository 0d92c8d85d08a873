//! mtls-kit command-line entry point.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use mtls_kit::{
    cli::{Cli, Command, SubjectArgs, TlsCommand},
    config::Config,
    mtls::{self, CertificateAuthority, Level, Subject, TlsConfig},
    port, pretty, setup_tracing,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    let format = cli.log_format.as_deref().unwrap_or(&config.log.format);
    if let Err(e) = setup_tracing(level, Some(format)) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Tls(cmd) => run_tls_command(cmd, config.tls),
        Command::Port { ip } => run_port(ip.as_deref()),
        Command::Pretty { file, compact } => run_pretty(file.as_deref(), !compact),
    }
}

/// Run TLS commands
fn run_tls_command(cmd: TlsCommand, configured: TlsConfig) -> ExitCode {
    match cmd {
        TlsCommand::InitCa { out, subject } => {
            let subject = to_subject(&subject, "mtls-kit CA");
            match mtls::make_ca(&subject, &out) {
                Ok(_) => {
                    println!("✅ CA written to {}", out.display());
                    println!("   {}", out.join("ca.crt").display());
                    println!("   {}", out.join("ca.key").display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "CA generation failed");
                    eprintln!("❌ {e}");
                    ExitCode::FAILURE
                }
            }
        }

        TlsCommand::Issue {
            ca_cert,
            ca_key,
            name,
            ip,
            out,
            subject,
        } => {
            let subject = to_subject(&subject, &name);
            match issue(&ca_cert, &ca_key, &subject, &name, &ip, &out) {
                Ok((crt, key)) => {
                    println!("✅ {name} issued");
                    println!("   {}", crt.display());
                    println!("   {}", key.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "certificate issuance failed");
                    eprintln!("❌ {e}");
                    ExitCode::FAILURE
                }
            }
        }

        TlsCommand::Check {
            cert,
            key,
            ca,
            level,
            sans,
        } => {
            let tls = TlsConfig {
                cert: cert.unwrap_or(configured.cert),
                key: key.unwrap_or(configured.key),
                ca: ca.unwrap_or(configured.ca),
                level: level.unwrap_or(configured.level),
                sans: if sans.is_empty() {
                    configured.sans
                } else {
                    sans
                },
                ..configured
            };
            run_check(&tls)
        }
    }
}

fn issue(
    ca_cert: &Path,
    ca_key: &Path,
    subject: &Subject,
    name: &str,
    ip: &str,
    out: &Path,
) -> mtls_kit::Result<(PathBuf, PathBuf)> {
    let ca = CertificateAuthority::load(ca_cert, ca_key)?;
    mtls::make_cert(&ca, subject, name, ip, out)?;
    Ok(mtls::generate::pair_paths(out, name))
}

fn run_check(tls: &TlsConfig) -> ExitCode {
    if tls.is_empty() {
        eprintln!("❌ No TLS material configured (set tls.cert / tls.key or pass --cert / --key)");
        return ExitCode::FAILURE;
    }

    let hashed = match tls.with_content_hash() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    let _span = hashed.span().entered();

    let resolved = match mtls::build_tls_config(&hashed) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "TLS config rejected");
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = resolved.server_config() {
        eprintln!("❌ Server config: {e}");
        return ExitCode::FAILURE;
    }
    info!("TLS config OK");

    println!("✅ TLS config valid");
    println!("   Level:       {} ({:?})", resolved.level, resolved.client_auth);
    println!(
        "   Versions:    {:?} - {:?}",
        resolved.min_version, resolved.max_version
    );
    println!("   Chain:       {} certificate(s)", resolved.cert_chain().len());
    match &resolved.ca_pool {
        Some(pool) => println!("   CA pool:     {} root(s)", pool.len()),
        None => println!("   CA pool:     none"),
    }
    if resolved.level == Level::RequireAndVerifyClientCertAndSan {
        if resolved.sans.is_empty() {
            println!("   SANs:        any");
        } else {
            println!("   SANs:        {}", resolved.sans.join(", "));
        }
    }
    println!("   Hash:        {}", hashed.hash);

    ExitCode::SUCCESS
}

fn run_port(ip: Option<&str>) -> ExitCode {
    match port::get_free(ip) {
        Ok(p) => {
            println!("{p}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_pretty(file: Option<&Path>, indent: bool) -> ExitCode {
    let res = match file {
        Some(path) => File::open(path)
            .map_err(|e| mtls_kit::Error::Read {
                path: path.to_path_buf(),
                source: e,
            })
            .and_then(|f| pretty::simple_pretty_json(io::BufReader::new(f), indent)),
        None => pretty::simple_pretty_json(io::stdin().lock(), indent),
    };

    match res {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn to_subject(args: &SubjectArgs, default_cn: &str) -> Subject {
    Subject {
        organization: args.org.clone(),
        organizational_unit: args.ou.clone(),
        ..Subject::new(args.cn.as_deref().unwrap_or(default_cn))
    }
}
