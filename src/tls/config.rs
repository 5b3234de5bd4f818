//! TLS client configuration
//!
//! [`TlsConfig`] is the configuration handed to
//! [`TlsEngine::client`](super::TlsEngine::client). It wraps an OpenSSL
//! context and keeps the settings stub callbacks usually want to assert on
//! (SNI, peer verification, ALPN).

use super::{Result, TlsError};
use openssl::pkey::PKey;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode, SslVersion};
use openssl::x509::X509;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// SSL 3.0 (deprecated, rarely used)
    Ssl3,
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> SslVersion {
        match self {
            TlsVersion::Ssl3 => SslVersion::SSL3,
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Get version as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Ssl3 => "SSLv3",
            TlsVersion::Tls10 => "TLSv1.0",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl FromStr for TlsVersion {
    type Err = TlsError;

    /// Parse TLS version from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SSLV3" | "SSL3" => Ok(TlsVersion::Ssl3),
            "TLSV1.0" | "TLS1.0" | "TLSV1" | "TLS1" => Ok(TlsVersion::Tls10),
            "TLSV1.1" | "TLS1.1" => Ok(TlsVersion::Tls11),
            "TLSV1.2" | "TLS1.2" => Ok(TlsVersion::Tls12),
            "TLSV1.3" | "TLS1.3" => Ok(TlsVersion::Tls13),
            _ => Err(TlsError::InvalidVersion(s.to_string())),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS client configuration (immutable after building)
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: SslContext,
    servername: Option<String>,
    verify_peer: bool,
    alpn: Vec<String>,
}

impl TlsConfig {
    /// Create a new client configuration builder
    pub fn client() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// SNI servername, if configured
    pub fn servername(&self) -> Option<&str> {
        self.servername.as_deref()
    }

    /// Whether the peer certificate is verified
    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    /// ALPN protocols offered, in preference order
    pub fn alpn_protocols(&self) -> &[String] {
        &self.alpn
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("servername", &self.servername)
            .field("verify_peer", &self.verify_peer)
            .field("alpn", &self.alpn)
            .finish_non_exhaustive()
    }
}

/// Client configuration builder
///
/// Setters chain; the first error any of them hits is kept and returned by
/// [`build`](Self::build), later setters become no-ops.
pub struct ClientConfigBuilder {
    ctx_builder: Option<SslContextBuilder>,
    error: Option<TlsError>,
    servername: Option<String>,
    verify_peer: bool,
    alpn: Vec<String>,
}

impl ClientConfigBuilder {
    fn new() -> Self {
        let (ctx_builder, error) = match SslContextBuilder::new(SslMethod::tls_client()) {
            Ok(mut ctx_builder) => {
                // Default: don't verify peer (for testing)
                ctx_builder.set_verify(SslVerifyMode::NONE);
                (Some(ctx_builder), None)
            }
            Err(e) => (None, Some(TlsError::OpenSsl(e))),
        };

        ClientConfigBuilder {
            ctx_builder,
            error,
            servername: None,
            verify_peer: false,
            alpn: Vec::new(),
        }
    }

    /// Run `f` on the context builder unless an earlier step already failed
    fn apply<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut SslContextBuilder) -> Result<()>,
    {
        if self.error.is_none() {
            if let Some(ctx_builder) = self.ctx_builder.as_mut() {
                if let Err(e) = f(ctx_builder) {
                    self.error = Some(e);
                }
            }
        }
        self
    }

    /// Set TLS version (both min and max)
    pub fn version(self, version: TlsVersion) -> Self {
        self.version_range(version, version)
    }

    /// Set TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Self {
        if min > max {
            if self.error.is_none() {
                self.error = Some(TlsError::InvalidConfig(format!(
                    "minimum version {} above maximum {}",
                    min, max
                )));
            }
            return self;
        }
        self.apply(|ctx| {
            ctx.set_min_proto_version(Some(min.to_openssl_version()))?;
            ctx.set_max_proto_version(Some(max.to_openssl_version()))?;
            Ok(())
        })
    }

    /// Set cipher list (for TLS <= 1.2)
    pub fn cipher_list(self, ciphers: &str) -> Self {
        self.apply(|ctx| Ok(ctx.set_cipher_list(ciphers)?))
    }

    /// Set cipher suites (for TLS 1.3)
    pub fn ciphersuites(self, ciphers: &str) -> Self {
        self.apply(|ctx| Ok(ctx.set_ciphersuites(ciphers)?))
    }

    /// Set ALPN protocols
    pub fn alpn(mut self, protocols: &[&str]) -> Self {
        self.alpn = protocols.iter().map(|p| p.to_string()).collect();
        self.apply(|ctx| {
            // Encode ALPN protocols (length-prefixed)
            let mut alpn_bytes = Vec::new();
            for proto in protocols {
                let len = u8::try_from(proto.len())
                    .ok()
                    .filter(|len| *len > 0)
                    .ok_or_else(|| {
                        TlsError::InvalidConfig(format!("invalid ALPN protocol: {:?}", proto))
                    })?;
                alpn_bytes.push(len);
                alpn_bytes.extend_from_slice(proto.as_bytes());
            }
            ctx.set_alpn_protos(&alpn_bytes)?;
            Ok(())
        })
    }

    /// Set SNI servername
    pub fn servername(mut self, name: impl Into<String>) -> Self {
        self.servername = Some(name.into());
        self
    }

    /// Enable/disable peer certificate verification
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self.apply(|ctx| {
            if verify {
                ctx.set_verify(SslVerifyMode::PEER);
                ctx.set_default_verify_paths()?;
            } else {
                ctx.set_verify(SslVerifyMode::NONE);
            }
            Ok(())
        })
    }

    /// Trust the CA certificates in a PEM file
    pub fn ca_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.apply(|ctx| Ok(ctx.set_ca_file(path.as_ref())?))
    }

    /// Load client certificate and private key from a single PEM file
    pub fn cert_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.apply(|ctx| {
            let cert_pem = std::fs::read(path.as_ref())?;

            let cert = X509::from_pem(&cert_pem)
                .map_err(|e| TlsError::Certificate(format!("Failed to load certificate: {}", e)))?;
            ctx.set_certificate(&cert)?;

            let key = PKey::private_key_from_pem(&cert_pem)
                .map_err(|e| TlsError::Certificate(format!("Failed to load private key: {}", e)))?;
            ctx.set_private_key(&key)?;

            Ok(())
        })
    }

    /// Build the TLS configuration
    pub fn build(self) -> Result<TlsConfig> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let ctx_builder = self
            .ctx_builder
            .ok_or_else(|| TlsError::InvalidConfig("no SSL context".to_string()))?;

        Ok(TlsConfig {
            ctx: ctx_builder.build(),
            servername: self.servername,
            verify_peer: self.verify_peer,
            alpn: self.alpn,
        })
    }
}
