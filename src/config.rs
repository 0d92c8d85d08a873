//! Configuration management

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::mtls::TlsConfig;
use crate::{Error, Result};

/// Environment variable prefix. `MTLS_KIT_TLS__LEVEL=hard` sets `tls.level`.
pub const ENV_PREFIX: &str = "MTLS_KIT_";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TLS identity and client-auth policy
    pub tls: TlsConfig,
    /// Logging configuration
    pub log: LogConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file, then environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::mtls::Level;

    #[test]
    fn test_load_without_file_gives_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/mtls-kit.yaml"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "tls:\n  cert: s.crt\n  key: s.key\n  ca: ca.crt\n  level: hardAndSAN\n  sans: [svc]\nlog:\n  format: json\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.tls.cert, "s.crt");
        assert_eq!(config.tls.level, Level::RequireAndVerifyClientCertAndSan);
        assert_eq!(config.tls.sans, ["svc"]);
        assert_eq!(config.log.format, "json");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_empty_level_means_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tls:\n  cert: s.crt\n  level: \"\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.tls.level, Level::NoClientCert);
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tls:\n  level: strict\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("strict"), "{err}");
    }
}
