//! OpenSSL-backed TLS engine
//!
//! [`OpensslEngine`] is a production [`TlsEngine`]: it layers an OpenSSL
//! client session over any [`Conn`], stubs included. Handshake, certificate
//! validation and cipher negotiation are OpenSSL's; this module only adapts
//! them to the [`TlsConn`] interface.

use super::config::TlsConfig;
use super::conn::TlsConn;
use super::engine::TlsEngine;
use super::state::ConnectionState;
use super::{Result, TlsError};
use crate::context::{Context, ContextError};
use crate::net::{Conn, ConnStream};
use openssl::error::ErrorStack;
use openssl::ssl::{Ssl, SslStream};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::Instant;

/// TLS engine backed by OpenSSL
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslEngine;

impl OpensslEngine {
    /// Name reported by [`TlsEngine::name`]
    pub const NAME: &'static str = "openssl";

    /// Create the engine
    pub fn new() -> Self {
        OpensslEngine
    }
}

impl TlsEngine for OpensslEngine {
    fn client(&self, conn: Box<dyn Conn>, config: &TlsConfig) -> Box<dyn TlsConn> {
        Box::new(OpensslConn::client(conn, config))
    }

    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn parrot(&self) -> String {
        // OpenSSL does not emulate other clients' fingerprints
        String::new()
    }
}

type TlsStream = SslStream<ConnStream<Box<dyn Conn>>>;

enum Stream {
    Tls(TlsStream),
    /// Session setup failed; the reason is reported by every operation
    Broken(String),
}

/// Client TLS connection over a [`Conn`]
///
/// Created by [`OpensslEngine::client`](TlsEngine::client). The handshake
/// runs on [`TlsConn::handshake`] or, failing that, on the first read or
/// write.
pub struct OpensslConn {
    stream: Stream,
    handshake_complete: bool,
    failed: bool,
    // Deadlines set by the caller, restored after a context-bounded handshake
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

impl OpensslConn {
    /// Set up a client session on `conn`; no I/O is performed
    pub fn client(conn: Box<dyn Conn>, config: &TlsConfig) -> Self {
        let stream = match Self::setup(conn, config) {
            Ok(stream) => Stream::Tls(stream),
            Err(e) => {
                log::warn!("TLS session setup failed: {e}");
                Stream::Broken(e.to_string())
            }
        };

        OpensslConn {
            stream,
            handshake_complete: false,
            failed: false,
            read_deadline: None,
            write_deadline: None,
        }
    }

    fn setup(conn: Box<dyn Conn>, config: &TlsConfig) -> std::result::Result<TlsStream, ErrorStack> {
        let mut ssl = Ssl::new(&config.ctx)?;

        // Set SNI servername if configured
        if let Some(servername) = config.servername() {
            ssl.set_hostname(servername)?;
            if config.verify_peer() {
                ssl.param_mut().set_host(servername)?;
            }
        }

        ssl.set_connect_state();
        SslStream::new(ssl, ConnStream::new(conn))
    }

    /// Whether a handshake or I/O error has occurred
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn tls(&self) -> io::Result<&TlsStream> {
        match &self.stream {
            Stream::Tls(stream) => Ok(stream),
            Stream::Broken(reason) => Err(io::Error::new(io::ErrorKind::NotConnected, reason.clone())),
        }
    }

    fn tls_mut(&mut self) -> io::Result<&mut TlsStream> {
        match &mut self.stream {
            Stream::Tls(stream) => Ok(stream),
            Stream::Broken(reason) => Err(io::Error::new(io::ErrorKind::NotConnected, reason.clone())),
        }
    }

    fn inner(&self) -> io::Result<&(dyn Conn + 'static)> {
        Ok(&**self.tls()?.get_ref().get_ref())
    }

    fn inner_mut(&mut self) -> io::Result<&mut (dyn Conn + 'static)> {
        Ok(&mut **self.tls_mut()?.get_mut().get_mut())
    }

    /// Run the handshake before the first read or write
    fn ensure_handshake(&mut self) -> io::Result<()> {
        if self.handshake_complete {
            return Ok(());
        }
        self.handshake(&Context::background()).map_err(|e| match e {
            TlsError::Io(e) => e,
            e => io::Error::new(io::ErrorKind::Other, e),
        })
    }

    fn restore_deadlines(&mut self) -> io::Result<()> {
        let (read, write) = (self.read_deadline, self.write_deadline);
        let inner = self.inner_mut()?;
        if read == write {
            inner.set_deadline(read)
        } else {
            inner.set_read_deadline(read)?;
            inner.set_write_deadline(write)
        }
    }

    fn io_failed(&mut self, e: io::Error) -> io::Error {
        self.failed = true;
        e
    }
}

impl Conn for OpensslConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_handshake()?;
        match self.tls_mut()?.read(buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(self.io_failed(e)),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_handshake()?;
        match self.tls_mut()?.write(buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(self.io_failed(e)),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        let send_close_notify = self.handshake_complete && !self.failed;
        match &mut self.stream {
            Stream::Tls(stream) => {
                if send_close_notify {
                    if let Err(e) = stream.shutdown() {
                        log::warn!("TLS close_notify failed: {e}");
                    }
                }
                stream.get_mut().get_mut().close()
            }
            Stream::Broken(_) => Ok(()),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner()?.local_addr()
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        self.inner()?.remote_addr()
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.inner_mut()?.set_deadline(deadline)?;
        self.read_deadline = deadline;
        self.write_deadline = deadline;
        Ok(())
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.inner_mut()?.set_read_deadline(deadline)?;
        self.read_deadline = deadline;
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.inner_mut()?.set_write_deadline(deadline)?;
        self.write_deadline = deadline;
        Ok(())
    }
}

impl TlsConn for OpensslConn {
    fn connection_state(&self) -> ConnectionState {
        match &self.stream {
            Stream::Tls(stream) => ConnectionState::from_ssl(stream.ssl(), self.handshake_complete),
            Stream::Broken(_) => ConnectionState::default(),
        }
    }

    fn handshake(&mut self, ctx: &Context) -> Result<()> {
        if self.handshake_complete {
            return Ok(());
        }
        if self.failed {
            return Err(TlsError::HandshakeFailed(
                "connection already failed".to_string(),
            ));
        }
        if let Some(err) = ctx.err() {
            return Err(TlsError::Canceled(err));
        }

        let deadline = ctx.deadline();
        let stream = self.tls_mut()?;
        if deadline.is_some() {
            stream.get_mut().get_mut().set_deadline(deadline)?;
        }

        log::debug!("starting TLS handshake");
        let result = stream.connect();

        let outcome = match result {
            Ok(()) => {
                self.handshake_complete = true;
                log::debug!(
                    "TLS handshake complete: {} {}",
                    stream_version(&self.stream),
                    stream_cipher(&self.stream)
                );
                Ok(())
            }
            Err(e) => {
                self.failed = true;
                log::debug!("TLS handshake failed: {e}");
                let timed_out = deadline.is_some()
                    && e.io_error().is_some_and(|io| {
                        matches!(
                            io.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        )
                    });
                if timed_out || ctx.err() == Some(ContextError::DeadlineExceeded) {
                    Err(TlsError::Canceled(ContextError::DeadlineExceeded))
                } else {
                    Err(TlsError::HandshakeFailed(e.to_string()))
                }
            }
        };

        if deadline.is_some() {
            if let Err(e) = self.restore_deadlines() {
                log::warn!("restoring deadlines after TLS handshake failed: {e}");
            }
        }

        outcome
    }
}

fn stream_version(stream: &Stream) -> &'static str {
    match stream {
        Stream::Tls(stream) => stream.ssl().version_str(),
        Stream::Broken(_) => "<undef>",
    }
}

fn stream_cipher(stream: &Stream) -> &'static str {
    match stream {
        Stream::Tls(stream) => stream
            .ssl()
            .current_cipher()
            .map(|c| c.name())
            .unwrap_or("<undef>"),
        Stream::Broken(_) => "<undef>",
    }
}

impl fmt::Debug for OpensslConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpensslConn")
            .field("handshake_complete", &self.handshake_complete)
            .field("failed", &self.failed)
            .field(
                "broken",
                &match &self.stream {
                    Stream::Tls(_) => None,
                    Stream::Broken(reason) => Some(reason),
                },
            )
            .finish()
    }
}
