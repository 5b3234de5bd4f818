//! tlsstub - TLS connection and TLS engine stubs for testing
//!
//! This crate provides callback-driven fakes for code that consumes TLS
//! connections or TLS "engines" (factories turning a plain connection into
//! a TLS one), so that such code can be unit-tested without a network or
//! certificate material.
//!
//! Every stub method delegates to a callback configured by the test author.
//! Invoking a method whose callback was never configured panics: an
//! incomplete test setup fails loudly instead of returning a zero value.
//!
//! The stubs ([`net::FuncConn`], [`tls::FuncTlsConn`], [`tls::FuncTlsEngine`])
//! perform no I/O. Two optional extras sit beside them: a [`net::Conn`]
//! implementation for [`std::net::TcpStream`] and [`tls::OpensslEngine`], a
//! real engine backed by OpenSSL. Neither is needed to use the stubs.
//!
//! # Examples
//!
//! ```
//! use tlsstub::context::Context;
//! use tlsstub::net::FuncConn;
//! use tlsstub::tls::{CipherSuite, ConnectionState, FuncTlsConn, TlsConn, TlsVersion};
//!
//! let mut conn = FuncTlsConn::new(FuncConn::new())
//!     .on_connection_state(|| ConnectionState {
//!         version: Some(TlsVersion::Tls13),
//!         cipher_suite: Some(CipherSuite::TLS_AES_128_GCM_SHA256),
//!         negotiated_protocol: Some("h2".to_string()),
//!         ..ConnectionState::default()
//!     })
//!     .on_handshake(|_ctx| Ok(()));
//!
//! conn.handshake(&Context::background()).unwrap();
//! assert_eq!(conn.connection_state().negotiated_protocol.as_deref(), Some("h2"));
//! ```

pub mod context;
pub mod net;
pub mod tls;

mod slot;

pub use tls::{Result, TlsError};
