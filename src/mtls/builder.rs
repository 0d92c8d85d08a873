//! TLS configuration resolution.
//!
//! [`build_tls_config`] turns a [`TlsConfig`] into a [`ResolvedTls`]: the
//! loaded identity, the optional CA pool and the client-authentication
//! mode, pinned to fixed protocol versions, cipher suites and curves.
//! [`ResolvedTls::server_config`] and [`ResolvedTls::client_config`] then
//! produce ready-to-use `rustls` configs.
//!
//! # File format
//!
//! Certificates, keys and CA bundles are PEM. Keys may be PKCS#1, PKCS#8
//! or SEC1.

use std::fs;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, aws_lc_rs};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::server::WebPkiClientVerifier;
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::sign::CertifiedKey;
use rustls::{
    CertificateError, CipherSuite, ClientConfig, DigitallySignedStruct, DistinguishedName,
    NamedGroup, ProtocolVersion, RootCertStore, ServerConfig, SignatureScheme,
};
use tracing::{debug, warn};

use crate::mtls::config::TlsConfig;
use crate::mtls::identity::CertIdentity;
use crate::mtls::level::Level;
use crate::{Error, Result};

/// Lowest protocol version ever negotiated.
pub const MIN_VERSION: ProtocolVersion = ProtocolVersion::TLSv1_2;

/// Highest protocol version ever negotiated.
pub const MAX_VERSION: ProtocolVersion = ProtocolVersion::TLSv1_3;

/// Cipher suites offered and accepted, in preference order.
pub static DEFAULT_CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::TLS13_AES_128_GCM_SHA256,
    CipherSuite::TLS13_AES_256_GCM_SHA384,
    CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
];

/// Key-exchange groups offered and accepted, in preference order.
pub static DEFAULT_CURVES: &[NamedGroup] = &[
    NamedGroup::X25519,
    NamedGroup::secp384r1,
    NamedGroup::secp256r1,
];

static VERSIONS: &[&rustls::SupportedProtocolVersion] =
    &[&rustls::version::TLS12, &rustls::version::TLS13];

/// Server-side client-certificate policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuth {
    /// Ask for a certificate; accept the handshake without one.
    Request,
    /// Require a certificate but do not validate its chain.
    RequireAny,
    /// Require a certificate that chains to the CA pool.
    RequireAndVerify,
}

impl From<Level> for ClientAuth {
    fn from(level: Level) -> Self {
        match level {
            // No certificate is ever demanded, but one is still asked for.
            Level::NoClientCert | Level::RequestClientCert => Self::Request,
            Level::RequireAnyClientCert => Self::RequireAny,
            Level::RequireAndVerifyClientCert | Level::RequireAndVerifyClientCertAndSan => {
                Self::RequireAndVerify
            }
        }
    }
}

/// Fully loaded TLS settings for one identity.
#[derive(Debug)]
pub struct ResolvedTls {
    /// Always [`MIN_VERSION`].
    pub min_version: ProtocolVersion,
    /// Always [`MAX_VERSION`].
    pub max_version: ProtocolVersion,
    /// Always [`DEFAULT_CIPHER_SUITES`].
    pub cipher_suites: &'static [CipherSuite],
    /// Always [`DEFAULT_CURVES`].
    pub curves: &'static [NamedGroup],
    /// Client-certificate policy derived from the level.
    pub client_auth: ClientAuth,
    /// Level the policy was derived from.
    pub level: Level,
    /// CA pool, used for client verification (server side) and server
    /// verification (client side).
    pub ca_pool: Option<Arc<RootCertStore>>,
    /// Skip server certificate verification (client side).
    pub insecure: bool,
    /// SANs accepted at [`Level::RequireAndVerifyClientCertAndSan`].
    pub sans: Vec<String>,
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

/// Load and validate everything `config` refers to.
///
/// Performs file reads only; safe to call from several threads at once.
///
/// # Errors
///
/// - [`Error::Read`] when the certificate or key file cannot be read.
/// - [`Error::CertLoad`] when they hold no usable PEM data.
/// - [`Error::Crypto`] when the key does not belong to the certificate.
/// - [`Error::CaLoad`] when the CA bundle is unreadable, empty or rejected.
pub fn build_tls_config(config: &TlsConfig) -> Result<ResolvedTls> {
    let cert_chain = load_certs(&config.cert)?;
    let key = load_private_key(&config.key)?;
    check_key_matches(&cert_chain, &key)?;

    let ca_pool = if config.ca.is_empty() {
        None
    } else {
        Some(Arc::new(load_ca_pool(&config.ca)?))
    };

    if config.level.verifies_chain() && ca_pool.is_none() {
        warn!(level = %config.level, "no CA bundle configured; server config will be refused");
    }

    let resolved = ResolvedTls {
        min_version: MIN_VERSION,
        max_version: MAX_VERSION,
        cipher_suites: DEFAULT_CIPHER_SUITES,
        curves: DEFAULT_CURVES,
        client_auth: ClientAuth::from(config.level),
        level: config.level,
        ca_pool,
        insecure: config.insecure,
        sans: config.sans.clone(),
        cert_chain,
        key,
    };

    debug!(
        cert = %config.cert,
        ca = %config.ca,
        level = %config.level,
        client_auth = ?resolved.client_auth,
        "TLS config resolved"
    );

    Ok(resolved)
}

/// The aws-lc-rs provider restricted to [`DEFAULT_CIPHER_SUITES`] and
/// [`DEFAULT_CURVES`], in their order.
pub fn provider() -> Arc<CryptoProvider> {
    let base = aws_lc_rs::default_provider();
    let cipher_suites = DEFAULT_CIPHER_SUITES
        .iter()
        .filter_map(|want| base.cipher_suites.iter().find(|s| s.suite() == *want))
        .copied()
        .collect();
    let kx_groups = DEFAULT_CURVES
        .iter()
        .filter_map(|want| base.kx_groups.iter().find(|g| g.name() == *want))
        .copied()
        .collect();
    Arc::new(CryptoProvider {
        cipher_suites,
        kx_groups,
        ..base
    })
}

impl ResolvedTls {
    /// The loaded certificate chain, leaf first.
    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    /// Build a server config presenting the loaded identity and enforcing
    /// the client-certificate policy.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the policy needs a CA pool and none was
    /// configured.
    pub fn server_config(&self) -> Result<ServerConfig> {
        let provider = provider();

        let verifier: Arc<dyn ClientCertVerifier> = match self.client_auth {
            ClientAuth::Request => Arc::new(AcceptAnyClientCert::new(provider.clone(), false)),
            ClientAuth::RequireAny => Arc::new(AcceptAnyClientCert::new(provider.clone(), true)),
            ClientAuth::RequireAndVerify => {
                let roots = self.ca_pool.clone().ok_or_else(|| {
                    Error::Config(format!(
                        "client auth level '{}' needs a CA bundle",
                        self.level
                    ))
                })?;
                let webpki = WebPkiClientVerifier::builder_with_provider(roots, provider.clone())
                    .build()
                    .map_err(|e| Error::Crypto(format!("building client verifier: {e}")))?;

                if self.level == Level::RequireAndVerifyClientCertAndSan {
                    Arc::new(SanVerifier {
                        inner: webpki,
                        sans: self.sans.clone(),
                    })
                } else {
                    webpki
                }
            }
        };

        let config = ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(VERSIONS)?
            .with_client_cert_verifier(verifier)
            .with_single_cert(self.cert_chain.clone(), self.key.clone_key())?;

        Ok(config)
    }

    /// Build a client config presenting the loaded identity.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when there is neither a CA pool nor `insecure`.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let provider = provider();
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(VERSIONS)?;

        let builder = if self.insecure {
            warn!("server certificate verification disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(SkipServerVerification(provider)))
        } else {
            let roots = self.ca_pool.clone().ok_or_else(|| {
                Error::Config("client config needs a CA bundle or insecure mode".into())
            })?;
            builder.with_root_certificates(roots)
        };

        let config = builder.with_client_auth_cert(self.cert_chain.clone(), self.key.clone_key())?;
        Ok(config)
    }
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let data = fs::read(path).map_err(|e| Error::read(path, e))?;

    let certs = CertificateDer::pem_slice_iter(&data)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::CertLoad(format!("Failed to parse certificates in '{path}': {e}")))?;

    if certs.is_empty() {
        return Err(Error::CertLoad(format!("No certificates found in '{path}'")));
    }
    Ok(certs)
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let data = fs::read(path).map_err(|e| Error::read(path, e))?;
    PrivateKeyDer::from_pem_slice(&data)
        .map_err(|e| Error::CertLoad(format!("No usable private key in '{path}': {e}")))
}

fn check_key_matches(
    chain: &[CertificateDer<'static>],
    key: &PrivateKeyDer<'static>,
) -> Result<()> {
    let signing_key = aws_lc_rs::default_provider()
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(|e| Error::Crypto(format!("unsupported private key: {e}")))?;

    CertifiedKey::new(chain.to_vec(), signing_key)
        .keys_match()
        .map_err(|e| Error::Crypto(format!("certificate and private key do not match: {e}")))
}

fn load_ca_pool(path: &str) -> Result<RootCertStore> {
    let data = fs::read(path)
        .map_err(|e| Error::CaLoad(format!("Failed to read CA bundle '{path}': {e}")))?;

    let mut roots = RootCertStore::empty();
    for cert in CertificateDer::pem_slice_iter(&data) {
        let cert =
            cert.map_err(|e| Error::CaLoad(format!("Failed to parse CA bundle '{path}': {e}")))?;
        roots
            .add(cert)
            .map_err(|e| Error::CaLoad(format!("CA certificate in '{path}' rejected: {e}")))?;
    }

    if roots.is_empty() {
        return Err(Error::CaLoad(format!("No CA certificates found in '{path}'")));
    }
    Ok(roots)
}

/// Requests a client certificate and accepts whatever is presented.
#[derive(Debug)]
struct AcceptAnyClientCert {
    provider: Arc<CryptoProvider>,
    mandatory: bool,
}

impl AcceptAnyClientCert {
    fn new(provider: Arc<CryptoProvider>, mandatory: bool) -> Self {
        Self {
            provider,
            mandatory,
        }
    }
}

impl ClientCertVerifier for AcceptAnyClientCert {
    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> std::result::Result<ClientCertVerified, rustls::Error> {
        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }

    fn client_auth_mandatory(&self) -> bool {
        self.mandatory
    }
}

/// Chain verification followed by a Subject Alternative Name check.
#[derive(Debug)]
struct SanVerifier {
    inner: Arc<dyn ClientCertVerifier>,
    sans: Vec<String>,
}

impl ClientCertVerifier for SanVerifier {
    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        self.inner.root_hint_subjects()
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> std::result::Result<ClientCertVerified, rustls::Error> {
        let verified = self
            .inner
            .verify_client_cert(end_entity, intermediates, now)?;

        let identity = CertIdentity::from_der(end_entity)
            .map_err(|_| rustls::Error::InvalidCertificate(CertificateError::BadEncoding))?;

        let accepted =
            identity.has_sans() && (self.sans.is_empty() || identity.matches_any(&self.sans));
        if !accepted {
            warn!(
                common_name = ?identity.common_name,
                dns = ?identity.san_dns_names,
                ips = ?identity.san_ips,
                "client certificate SANs not accepted"
            );
            return Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ));
        }

        debug!(common_name = ?identity.common_name, "client certificate SAN accepted");
        Ok(verified)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }

    fn offer_client_auth(&self) -> bool {
        self.inner.offer_client_auth()
    }

    fn client_auth_mandatory(&self) -> bool {
        self.inner.client_auth_mandatory()
    }
}

/// Accepts any server certificate. Handshake signatures are still checked.
#[derive(Debug)]
struct SkipServerVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
