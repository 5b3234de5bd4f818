//! TLS connection and TLS engine abstractions, their stubs, and an OpenSSL engine
//!
//! # Architecture
//!
//! 1. [`TlsConn`] is a [`Conn`](crate::net::Conn) that also exposes the
//!    negotiated [`ConnectionState`] and a cancellable handshake
//! 2. [`TlsEngine`] turns a plain `Conn` plus a [`TlsConfig`] into a `TlsConn`
//! 3. [`FuncTlsConn`] and [`FuncTlsEngine`] implement both by delegating to
//!    test-supplied callbacks
//! 4. [`OpensslEngine`] implements `TlsEngine` for real, on top of OpenSSL
//!
//! # Examples
//!
//! ```
//! use tlsstub::net::FuncConn;
//! use tlsstub::tls::{FuncTlsConn, FuncTlsEngine, TlsConfig, TlsConn, TlsEngine};
//!
//! let engine: FuncTlsEngine<Box<dyn TlsConn>> = FuncTlsEngine::new()
//!     .on_client(|_conn, _config| Box::new(FuncTlsConn::default()) as Box<dyn TlsConn>)
//!     .on_name(|| "test-engine".to_string())
//!     .on_parrot(String::new);
//!
//! let config = TlsConfig::client().build().unwrap();
//! let _conn = TlsEngine::client(&engine, Box::new(FuncConn::new()), &config);
//! assert_eq!(TlsEngine::name(&engine), "test-engine");
//! assert!(TlsEngine::parrot(&engine).is_empty());
//! ```

pub mod cert;
pub mod config;
pub mod conn;
pub mod engine;
pub mod session;
pub mod state;

pub use cert::CertInfo;
pub use config::{ClientConfigBuilder, TlsConfig, TlsVersion};
pub use conn::{FuncTlsConn, TlsConn};
pub use engine::{FuncTlsEngine, TlsEngine};
pub use session::{OpensslConn, OpensslEngine};
pub use state::{CipherSuite, ConnectionState};

use crate::context::ContextError;

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Handshake canceled: {0}")]
    Canceled(#[from] ContextError),

    #[error("TLS operation failed: {0}")]
    OperationFailed(String),
}
