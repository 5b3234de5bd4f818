//! Byte-stream connection abstraction
//!
//! [`Conn`] is the plain, unencrypted connection that TLS connections are
//! layered on: read, write, close, address queries and deadlines. It is
//! implemented by [`TcpStream`](std::net::TcpStream) for production use and
//! by [`FuncConn`] for tests.
//!
//! # Examples
//!
//! ```
//! use std::io;
//! use tlsstub::net::{Conn, FuncConn};
//!
//! let mut conn = FuncConn::new()
//!     .on_write(|buf| Ok(buf.len()))
//!     .on_close(|| Err(io::Error::from(io::ErrorKind::NotConnected)));
//!
//! assert_eq!(conn.write(b"hello").unwrap(), 5);
//! assert!(conn.close().is_err());
//! ```

pub mod func;
pub mod tcp;

pub use func::FuncConn;

use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::Instant;

/// Plain byte-stream connection
///
/// Deadlines are absolute points in time; `None` clears the deadline.
pub trait Conn: Send {
    /// Read data from the connection
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Close the connection
    fn close(&mut self) -> io::Result<()>;

    /// Local address of the connection
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Remote address of the connection
    fn remote_addr(&self) -> io::Result<SocketAddr>;

    /// Set both read and write deadlines
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set the read deadline
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set the write deadline
    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;
}

impl<C: Conn + ?Sized> Conn for Box<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        (**self).local_addr()
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        (**self).remote_addr()
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(deadline)
    }
}

/// Adapts a [`Conn`] to [`std::io::Read`] and [`std::io::Write`]
///
/// TLS libraries layer on `Read + Write` transports; this is the glue that
/// lets them run on top of any `Conn`, stubs included.
#[derive(Debug)]
pub struct ConnStream<C> {
    conn: C,
}

impl<C: Conn> ConnStream<C> {
    /// Wrap a connection
    pub fn new(conn: C) -> Self {
        ConnStream { conn }
    }

    /// Get a reference to the wrapped connection
    pub fn get_ref(&self) -> &C {
        &self.conn
    }

    /// Get a mutable reference to the wrapped connection
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Unwrap the connection
    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C: Conn> Read for ConnStream<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.conn.read(buf)
    }
}

impl<C: Conn> Write for ConnStream<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.conn.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Conn has no userspace buffer
        Ok(())
    }
}
