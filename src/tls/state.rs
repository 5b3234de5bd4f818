//! Negotiated TLS session state

use super::cert::{self, CertInfo};
use super::config::TlsVersion;
use openssl::ssl::{NameType, SslRef};
use std::fmt;

/// IANA TLS cipher suite identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherSuite(pub u16);

impl CipherSuite {
    // TLS 1.3
    pub const TLS_AES_128_GCM_SHA256: CipherSuite = CipherSuite(0x1301);
    pub const TLS_AES_256_GCM_SHA384: CipherSuite = CipherSuite(0x1302);
    pub const TLS_CHACHA20_POLY1305_SHA256: CipherSuite = CipherSuite(0x1303);

    // TLS 1.2 ECDHE
    pub const TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256: CipherSuite = CipherSuite(0xc02b);
    pub const TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384: CipherSuite = CipherSuite(0xc02c);
    pub const TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256: CipherSuite = CipherSuite(0xc02f);
    pub const TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384: CipherSuite = CipherSuite(0xc030);
    pub const TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256: CipherSuite = CipherSuite(0xcca8);
    pub const TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256: CipherSuite = CipherSuite(0xcca9);

    /// IANA name, for the suites listed above
    pub fn name(&self) -> Option<&'static str> {
        let name = match self.0 {
            0x1301 => "TLS_AES_128_GCM_SHA256",
            0x1302 => "TLS_AES_256_GCM_SHA384",
            0x1303 => "TLS_CHACHA20_POLY1305_SHA256",
            0xc02b => "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
            0xc02c => "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
            0xc02f => "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
            0xc030 => "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
            0xcca8 => "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
            0xcca9 => "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "CipherSuite({:#06x})", self.0),
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Snapshot of a negotiated TLS session
///
/// The default value describes a connection on which nothing has been
/// negotiated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Negotiated protocol version
    pub version: Option<TlsVersion>,

    /// Negotiated cipher suite
    pub cipher_suite: Option<CipherSuite>,

    /// Protocol selected through ALPN
    pub negotiated_protocol: Option<String>,

    /// SNI servername sent by the client
    pub server_name: Option<String>,

    /// Whether the session was resumed
    pub did_resume: bool,

    /// Whether the handshake has completed
    pub handshake_complete: bool,

    /// Peer certificate chain (index 0 is the peer cert)
    pub peer_certificates: Vec<CertInfo>,
}

impl ConnectionState {
    /// Capture the state of an OpenSSL session
    pub fn from_ssl(ssl: &SslRef, handshake_complete: bool) -> Self {
        if !handshake_complete {
            return ConnectionState::default();
        }

        ConnectionState {
            version: ssl.version_str().parse().ok(),
            cipher_suite: ssl
                .current_cipher()
                .map(|c| CipherSuite(u16::from_be_bytes(c.protocol_id()))),
            negotiated_protocol: ssl
                .selected_alpn_protocol()
                .map(|p| String::from_utf8_lossy(p).into_owned()),
            server_name: ssl.servername(NameType::HOST_NAME).map(|s| s.to_string()),
            did_resume: ssl.session_reused(),
            handshake_complete,
            peer_certificates: cert::peer_chain(ssl),
        }
    }
}
