//! Peer certificate summaries
//!
//! [`ConnectionState`](super::ConnectionState) does not carry raw
//! certificates; it carries the fields tests typically assert on.

use openssl::nid::Nid;
use openssl::ssl::SslRef;
use openssl::x509::{X509NameRef, X509Ref};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Certificate information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertInfo {
    /// Certificate subject (Common Name)
    pub subject: Option<String>,
    /// Certificate issuer (Common Name)
    pub issuer: Option<String>,
    /// Subject Alternative Names, as `DNS:name` or `IP:address`
    pub subject_alt_names: Vec<String>,
}

impl CertInfo {
    /// Extract certificate information from an X.509 certificate
    pub fn from_x509(cert: &X509Ref) -> Self {
        CertInfo {
            subject: common_name(cert.subject_name()),
            issuer: common_name(cert.issuer_name()),
            subject_alt_names: subject_alt_names(cert),
        }
    }
}

fn common_name(name: &X509NameRef) -> Option<String> {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|s| s.to_string())
}

fn subject_alt_names(cert: &X509Ref) -> Vec<String> {
    let Some(sans) = cert.subject_alt_names() else {
        return Vec::new();
    };

    sans.iter()
        .filter_map(|name| {
            if let Some(dns) = name.dnsname() {
                return Some(format!("DNS:{}", dns));
            }
            match name.ipaddress()? {
                ip if ip.len() == 4 => {
                    let octets: [u8; 4] = ip.try_into().ok()?;
                    Some(format!("IP:{}", Ipv4Addr::from(octets)))
                }
                ip if ip.len() == 16 => {
                    let octets: [u8; 16] = ip.try_into().ok()?;
                    Some(format!("IP:{}", Ipv6Addr::from(octets)))
                }
                _ => None,
            }
        })
        .collect()
}

/// Summarize the peer's certificate chain, leaf first
///
/// On the client side OpenSSL's peer chain already starts with the leaf;
/// the bare peer certificate is only used when no chain is available.
pub fn peer_chain(ssl: &SslRef) -> Vec<CertInfo> {
    if let Some(chain) = ssl.peer_cert_chain() {
        return chain.iter().map(CertInfo::from_x509).collect();
    }
    ssl.peer_certificate()
        .map(|cert| vec![CertInfo::from_x509(&cert)])
        .unwrap_or_default()
}
