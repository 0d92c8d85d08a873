//! Certificate identity extraction.
//!
//! Parses an X.509 DER-encoded certificate and pulls out the fields the
//! SAN check works on: Common Name, SAN DNS names, SAN IP addresses and
//! SAN URIs.

use std::net::IpAddr;

use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

use crate::{Error, Result};

/// Identity fields of a presented certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertIdentity {
    /// Certificate Common Name (CN).
    pub common_name: Option<String>,

    /// Subject Alternative Name: DNS entries.
    pub san_dns_names: Vec<String>,

    /// Subject Alternative Name: IP address entries.
    pub san_ips: Vec<IpAddr>,

    /// Subject Alternative Name: URI entries.
    pub san_uris: Vec<String>,
}

impl CertIdentity {
    /// Parse a DER-encoded certificate and extract its identity fields.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::CertLoad(format!("Failed to parse certificate: {e}")))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|attr| attr.as_str().ok())
            .map(str::to_owned);

        let mut identity = Self {
            common_name,
            ..Self::default()
        };

        if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
            for name in &san_ext.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => identity.san_dns_names.push((*dns).to_owned()),
                    GeneralName::URI(uri) => identity.san_uris.push((*uri).to_owned()),
                    GeneralName::IPAddress(raw) => {
                        if let Some(ip) = ip_from_octets(raw) {
                            identity.san_ips.push(ip);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(identity)
    }

    /// True if the certificate carries at least one SAN.
    #[must_use]
    pub fn has_sans(&self) -> bool {
        !(self.san_dns_names.is_empty() && self.san_ips.is_empty() && self.san_uris.is_empty())
    }

    /// True if any SAN appears in `expected`.
    ///
    /// DNS names compare case-insensitively, IPs by address (so `::1` and
    /// `0:0:0:0:0:0:0:1` are the same), URIs exactly.
    #[must_use]
    pub fn matches_any(&self, expected: &[String]) -> bool {
        expected.iter().any(|want| {
            if let Ok(ip) = want.parse::<IpAddr>() {
                return self.san_ips.contains(&ip);
            }
            self.san_dns_names
                .iter()
                .any(|dns| dns.eq_ignore_ascii_case(want))
                || self.san_uris.iter().any(|uri| uri == want)
        })
    }
}

fn ip_from_octets(raw: &[u8]) -> Option<IpAddr> {
    match raw.len() {
        4 => <[u8; 4]>::try_from(raw).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(raw).ok().map(IpAddr::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType, string::Ia5String};

    fn make_cert_der(cn: &str, sans: &[SanType]) -> Vec<u8> {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.subject_alt_names = sans.to_vec();

        let key_pair = KeyPair::generate().expect("key generation failed");
        let cert = params
            .self_signed(&key_pair)
            .expect("rcgen cert generation failed");
        cert.der().to_vec()
    }

    fn dns_san(s: &str) -> SanType {
        SanType::DnsName(Ia5String::try_from(s).unwrap())
    }

    fn uri_san(s: &str) -> SanType {
        SanType::URI(Ia5String::try_from(s).unwrap())
    }

    fn ip_san(s: &str) -> SanType {
        SanType::IpAddress(s.parse().unwrap())
    }

    #[test]
    fn from_der_extracts_common_name() {
        let der = make_cert_der("billing", &[dns_san("billing.internal")]);
        let id = CertIdentity::from_der(&der).unwrap();
        assert_eq!(id.common_name.as_deref(), Some("billing"));
    }

    #[test]
    fn from_der_extracts_every_san_kind() {
        let der = make_cert_der(
            "multi",
            &[
                dns_san("localhost"),
                ip_san("127.0.0.1"),
                ip_san("::1"),
                uri_san("spiffe://corp/svc/multi"),
            ],
        );
        let id = CertIdentity::from_der(&der).unwrap();
        assert_eq!(id.san_dns_names, ["localhost"]);
        assert_eq!(id.san_ips.len(), 2);
        assert!(id.san_ips.contains(&"::1".parse().unwrap()));
        assert_eq!(id.san_uris, ["spiffe://corp/svc/multi"]);
        assert!(id.has_sans());
    }

    #[test]
    fn from_der_invalid_bytes_returns_error() {
        assert!(CertIdentity::from_der(b"not a cert").is_err());
    }

    #[test]
    fn matches_any_compares_by_kind() {
        let id = CertIdentity {
            san_dns_names: vec!["Svc.Internal".into()],
            san_ips: vec!["10.0.0.1".parse().unwrap(), "::1".parse().unwrap()],
            san_uris: vec!["spiffe://corp/a".into()],
            ..Default::default()
        };

        assert!(id.matches_any(&["svc.internal".into()]));
        assert!(id.matches_any(&["0:0:0:0:0:0:0:1".into()]));
        assert!(id.matches_any(&["spiffe://corp/a".into()]));
        assert!(!id.matches_any(&["spiffe://corp/A".into()]));
        assert!(!id.matches_any(&["10.0.0.2".into(), "other".into()]));
        assert!(!id.matches_any(&[]));
    }

    #[test]
    fn default_identity_has_no_sans() {
        assert!(!CertIdentity::default().has_sans());
    }
}
