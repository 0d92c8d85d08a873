//! TLS identity / policy configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! tls:
//!   cert: "/etc/svc/tls/server.crt"
//!   key:  "/etc/svc/tls/server.key"
//!   ca:   "/etc/svc/tls/ca.crt"
//!   level: hardAndSAN
//!   sans: ["billing.internal", "10.0.0.12"]
//! ```

use std::fs;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::mtls::level::Level;
use crate::{Error, Result};

/// One TLS identity and client-authentication policy.
///
/// Built once from configuration input and treated as read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Fingerprint of the cert + key + CA contents, used to spot changes
    /// on disk behind unchanged paths.
    pub hash: String,

    /// Path to the PEM-encoded certificate chain.
    pub cert: String,

    /// Path to the PEM-encoded private key.
    pub key: String,

    /// Path to the PEM-encoded CA bundle. Enables client verification.
    pub ca: String,

    /// Client-certificate authentication level.
    pub level: Level,

    /// Skip server certificate verification (client side only).
    pub insecure: bool,

    /// Subject Alternative Names accepted at the `hardAndSAN` level.
    pub sans: Vec<String>,
}

impl TlsConfig {
    /// True when no TLS material is configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty() && self.cert.is_empty() && self.key.is_empty() && !self.insecure
    }

    /// Compare everything that affects the served identity or the client
    /// policy. `insecure` is deliberately left out.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.cert == other.cert
            && self.key == other.key
            && self.ca == other.ca
            && self.level == other.level
            && self.sans == other.sans
    }

    /// Return a copy whose `hash` is the hex SHA-256 of the cert, key and
    /// CA file contents (in that order, CA only when set).
    pub fn with_content_hash(&self) -> Result<Self> {
        let mut hasher = Sha256::new();
        for path in [&self.cert, &self.key, &self.ca] {
            if path.is_empty() {
                continue;
            }
            let data = fs::read(path).map_err(|e| Error::read(path, e))?;
            hasher.update(&data);
        }

        Ok(Self {
            hash: format!("{:x}", hasher.finalize()),
            ..self.clone()
        })
    }

    /// A span carrying this config's attributes, for structured logs.
    ///
    /// Empty configs produce a disabled span.
    pub fn span(&self) -> tracing::Span {
        if self.is_empty() {
            return tracing::Span::none();
        }

        tracing::info_span!(
            "tls",
            cert = %self.cert,
            key = %self.key,
            ca = %self.ca,
            hash = %self.hash,
            level = %self.level,
            insecure = self.insecure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(cert: &str, insecure: bool) -> TlsConfig {
        TlsConfig {
            cert: cert.into(),
            insecure,
            ..Default::default()
        }
    }

    #[test]
    fn default_config_is_empty() {
        assert!(TlsConfig::default().is_empty());
    }

    #[test]
    fn cert_or_insecure_makes_config_non_empty() {
        assert!(!cfg("x", false).is_empty());
        assert!(!cfg("", true).is_empty());

        let only_key = TlsConfig {
            key: "k".into(),
            ..Default::default()
        };
        assert!(!only_key.is_empty());
    }

    #[test]
    fn ca_alone_does_not_count_as_material() {
        let only_ca = TlsConfig {
            ca: "ca.crt".into(),
            ..Default::default()
        };
        assert!(only_ca.is_empty());
    }

    #[test]
    fn same_as_ignores_insecure() {
        assert!(cfg("a", true).same_as(&cfg("a", false)));
    }

    #[test]
    fn same_as_is_reflexive_and_symmetric() {
        let a = TlsConfig {
            cert: "a.crt".into(),
            key: "a.key".into(),
            ca: "ca.crt".into(),
            level: Level::RequireAndVerifyClientCert,
            ..Default::default()
        };
        let b = TlsConfig {
            level: Level::RequireAnyClientCert,
            ..a.clone()
        };

        assert!(a.same_as(&a));
        assert_eq!(a.same_as(&b), b.same_as(&a));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn same_as_notices_path_and_hash_changes() {
        let base = cfg("a", false);
        assert!(!base.same_as(&cfg("b", false)));

        let rehashed = TlsConfig {
            hash: "ff".into(),
            ..base.clone()
        };
        assert!(!base.same_as(&rehashed));
    }

    #[test]
    fn content_hash_tracks_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("c.crt");
        let key = dir.path().join("c.key");
        fs::write(&cert, "cert-v1").unwrap();
        fs::write(&key, "key").unwrap();

        let base = TlsConfig {
            cert: cert.to_string_lossy().into_owned(),
            key: key.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let first = base.with_content_hash().unwrap();
        assert_eq!(first.hash.len(), 64);
        assert_eq!(first.hash, base.with_content_hash().unwrap().hash);

        fs::write(&cert, "cert-v2").unwrap();
        let second = base.with_content_hash().unwrap();
        assert!(!first.same_as(&second));
    }

    #[test]
    fn content_hash_covers_ca_bundle() {
        // GIVEN cert, key and CA files on disk
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        fs::write(path("c.crt"), "cert").unwrap();
        fs::write(path("c.key"), "key").unwrap();
        fs::write(path("ca.crt"), "ca-v1").unwrap();

        let base = TlsConfig {
            cert: path("c.crt"),
            key: path("c.key"),
            ca: path("ca.crt"),
            ..Default::default()
        };
        let without_ca = TlsConfig {
            ca: String::new(),
            ..base.clone()
        };
        let first = base.with_content_hash().unwrap();
        assert_ne!(first.hash, without_ca.with_content_hash().unwrap().hash);

        // WHEN only the CA contents change
        fs::write(path("ca.crt"), "ca-v2").unwrap();
        let second = base.with_content_hash().unwrap();

        // THEN the hash changes
        assert_ne!(first.hash, second.hash);
        assert!(!first.same_as(&second));
    }

    #[test]
    fn empty_config_has_no_span() {
        assert!(TlsConfig::default().span().is_none());
    }

    #[test]
    fn non_empty_config_has_a_span() {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(!cfg("server.crt", false).span().is_none());
            assert!(!cfg("", true).span().is_none());
        });
    }

    #[test]
    fn content_hash_reports_missing_file() {
        let missing = cfg("/nonexistent/tls/c.crt", false);
        let err = missing.with_content_hash().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn deserialises_external_keys() {
        let yaml = r#"
cert: /tls/s.crt
key: /tls/s.key
ca: /tls/ca.crt
level: hard
insecure: true
hash: abc
sans: ["svc.local"]
"#;
        let cfg: TlsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.cert, "/tls/s.crt");
        assert_eq!(cfg.ca, "/tls/ca.crt");
        assert_eq!(cfg.level, Level::RequireAndVerifyClientCert);
        assert!(cfg.insecure);
        assert_eq!(cfg.hash, "abc");
        assert_eq!(cfg.sans, ["svc.local"]);
    }
}
