//! Callback-driven [`Conn`] stub

use super::Conn;
use crate::slot;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;

type ReadFn = dyn FnMut(&mut [u8]) -> io::Result<usize> + Send;
type WriteFn = dyn FnMut(&[u8]) -> io::Result<usize> + Send;
type CloseFn = dyn FnMut() -> io::Result<()> + Send;
type AddrFn = dyn Fn() -> io::Result<SocketAddr> + Send;
type DeadlineFn = dyn FnMut(Option<Instant>) -> io::Result<()> + Send;

/// Stub [`Conn`] whose every method calls a configured callback
///
/// Arguments are forwarded to the callback unchanged and its result is
/// returned unchanged. Calling a method whose callback was not configured
/// panics.
#[derive(Default)]
pub struct FuncConn {
    read: Option<Box<ReadFn>>,
    write: Option<Box<WriteFn>>,
    close: Option<Box<CloseFn>>,
    local_addr: Option<Box<AddrFn>>,
    remote_addr: Option<Box<AddrFn>>,
    set_deadline: Option<Box<DeadlineFn>>,
    set_read_deadline: Option<Box<DeadlineFn>>,
    set_write_deadline: Option<Box<DeadlineFn>>,
}

impl FuncConn {
    /// Create a stub with no callbacks configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure [`Conn::read`]
    pub fn on_read<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut [u8]) -> io::Result<usize> + Send + 'static,
    {
        self.read = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::write`]
    pub fn on_write<F>(mut self, f: F) -> Self
    where
        F: FnMut(&[u8]) -> io::Result<usize> + Send + 'static,
    {
        self.write = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::close`]
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> io::Result<()> + Send + 'static,
    {
        self.close = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::local_addr`]
    pub fn on_local_addr<F>(mut self, f: F) -> Self
    where
        F: Fn() -> io::Result<SocketAddr> + Send + 'static,
    {
        self.local_addr = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::remote_addr`]
    pub fn on_remote_addr<F>(mut self, f: F) -> Self
    where
        F: Fn() -> io::Result<SocketAddr> + Send + 'static,
    {
        self.remote_addr = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::set_deadline`]
    pub fn on_set_deadline<F>(mut self, f: F) -> Self
    where
        F: FnMut(Option<Instant>) -> io::Result<()> + Send + 'static,
    {
        self.set_deadline = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::set_read_deadline`]
    pub fn on_set_read_deadline<F>(mut self, f: F) -> Self
    where
        F: FnMut(Option<Instant>) -> io::Result<()> + Send + 'static,
    {
        self.set_read_deadline = Some(Box::new(f));
        self
    }

    /// Configure [`Conn::set_write_deadline`]
    pub fn on_set_write_deadline<F>(mut self, f: F) -> Self
    where
        F: FnMut(Option<Instant>) -> io::Result<()> + Send + 'static,
    {
        self.set_write_deadline = Some(Box::new(f));
        self
    }
}

impl Conn for FuncConn {
    #[track_caller]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        log::trace!("FuncConn::read({} bytes)", buf.len());
        slot::get_mut(&mut self.read, "FuncConn", "read")(buf)
    }

    #[track_caller]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        log::trace!("FuncConn::write({} bytes)", buf.len());
        slot::get_mut(&mut self.write, "FuncConn", "write")(buf)
    }

    #[track_caller]
    fn close(&mut self) -> io::Result<()> {
        log::trace!("FuncConn::close");
        slot::get_mut(&mut self.close, "FuncConn", "close")()
    }

    #[track_caller]
    fn local_addr(&self) -> io::Result<SocketAddr> {
        log::trace!("FuncConn::local_addr");
        slot::get(&self.local_addr, "FuncConn", "local_addr")()
    }

    #[track_caller]
    fn remote_addr(&self) -> io::Result<SocketAddr> {
        log::trace!("FuncConn::remote_addr");
        slot::get(&self.remote_addr, "FuncConn", "remote_addr")()
    }

    #[track_caller]
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        log::trace!("FuncConn::set_deadline({deadline:?})");
        slot::get_mut(&mut self.set_deadline, "FuncConn", "set_deadline")(deadline)
    }

    #[track_caller]
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        log::trace!("FuncConn::set_read_deadline({deadline:?})");
        slot::get_mut(&mut self.set_read_deadline, "FuncConn", "set_read_deadline")(deadline)
    }

    #[track_caller]
    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        log::trace!("FuncConn::set_write_deadline({deadline:?})");
        slot::get_mut(&mut self.set_write_deadline, "FuncConn", "set_write_deadline")(deadline)
    }
}

impl fmt::Debug for FuncConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncConn")
            .field("read", &slot::state(&self.read))
            .field("write", &slot::state(&self.write))
            .field("close", &slot::state(&self.close))
            .field("local_addr", &slot::state(&self.local_addr))
            .field("remote_addr", &slot::state(&self.remote_addr))
            .field("set_deadline", &slot::state(&self.set_deadline))
            .field("set_read_deadline", &slot::state(&self.set_read_deadline))
            .field("set_write_deadline", &slot::state(&self.set_write_deadline))
            .finish()
    }
}
