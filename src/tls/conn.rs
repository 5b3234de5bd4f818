//! TLS connection abstraction and its stub

use super::state::ConnectionState;
use super::Result;
use crate::context::Context;
use crate::net::{Conn, FuncConn};
use crate::slot;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;

/// A [`Conn`] secured with TLS
///
/// Mirrors the connection type of typical TLS libraries: a byte stream that
/// also reports the negotiated session and can run (or replay) a handshake.
pub trait TlsConn: Conn {
    /// Snapshot of the negotiated TLS session
    fn connection_state(&self) -> ConnectionState;

    /// Perform the TLS handshake, honouring `ctx` where the implementation can
    fn handshake(&mut self, ctx: &Context) -> Result<()>;
}

impl<T: TlsConn + ?Sized> TlsConn for Box<T> {
    fn connection_state(&self) -> ConnectionState {
        (**self).connection_state()
    }

    fn handshake(&mut self, ctx: &Context) -> Result<()> {
        (**self).handshake(ctx)
    }
}

type ConnectionStateFn = dyn Fn() -> ConnectionState + Send;
type HandshakeFn = dyn FnMut(&Context) -> Result<()> + Send;

/// Stub [`TlsConn`]
///
/// Byte-stream methods go to the wrapped [`FuncConn`]; the TLS methods go to
/// their own callbacks. As with `FuncConn`, an unconfigured callback panics
/// when invoked.
pub struct FuncTlsConn {
    conn: FuncConn,
    connection_state: Option<Box<ConnectionStateFn>>,
    handshake: Option<Box<HandshakeFn>>,
}

impl FuncTlsConn {
    /// Wrap a [`FuncConn`], with no TLS callbacks configured
    pub fn new(conn: FuncConn) -> Self {
        FuncTlsConn {
            conn,
            connection_state: None,
            handshake: None,
        }
    }

    /// Configure [`TlsConn::connection_state`]
    pub fn on_connection_state<F>(mut self, f: F) -> Self
    where
        F: Fn() -> ConnectionState + Send + 'static,
    {
        self.connection_state = Some(Box::new(f));
        self
    }

    /// Configure [`TlsConn::handshake`]
    pub fn on_handshake<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Context) -> Result<()> + Send + 'static,
    {
        self.handshake = Some(Box::new(f));
        self
    }

    /// The wrapped byte-stream stub
    pub fn conn(&self) -> &FuncConn {
        &self.conn
    }

    /// Mutable access to the wrapped byte-stream stub
    pub fn conn_mut(&mut self) -> &mut FuncConn {
        &mut self.conn
    }
}

impl Default for FuncTlsConn {
    fn default() -> Self {
        FuncTlsConn::new(FuncConn::new())
    }
}

impl Conn for FuncTlsConn {
    #[track_caller]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.conn.read(buf)
    }

    #[track_caller]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.conn.write(buf)
    }

    #[track_caller]
    fn close(&mut self) -> io::Result<()> {
        self.conn.close()
    }

    #[track_caller]
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.conn.local_addr()
    }

    #[track_caller]
    fn remote_addr(&self) -> io::Result<SocketAddr> {
        self.conn.remote_addr()
    }

    #[track_caller]
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.conn.set_deadline(deadline)
    }

    #[track_caller]
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.conn.set_read_deadline(deadline)
    }

    #[track_caller]
    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.conn.set_write_deadline(deadline)
    }
}

impl TlsConn for FuncTlsConn {
    #[track_caller]
    fn connection_state(&self) -> ConnectionState {
        log::trace!("FuncTlsConn::connection_state");
        slot::get(&self.connection_state, "FuncTlsConn", "connection_state")()
    }

    #[track_caller]
    fn handshake(&mut self, ctx: &Context) -> Result<()> {
        log::trace!("FuncTlsConn::handshake");
        slot::get_mut(&mut self.handshake, "FuncTlsConn", "handshake")(ctx)
    }
}

impl fmt::Debug for FuncTlsConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncTlsConn")
            .field("conn", &self.conn)
            .field("connection_state", &slot::state(&self.connection_state))
            .field("handshake", &slot::state(&self.handshake))
            .finish()
    }
}

const _: fn() = || {
    fn assert_tls_conn<T: TlsConn>() {}
    assert_tls_conn::<FuncTlsConn>();
    assert_tls_conn::<Box<dyn TlsConn>>();
};
