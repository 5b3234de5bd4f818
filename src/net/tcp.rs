//! [`Conn`] for plain TCP streams

use super::Conn;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

/// Shortest socket timeout used for a deadline that has already passed
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Convert an absolute deadline into a socket timeout
fn timeout_until(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|d| d.saturating_duration_since(Instant::now()).max(MIN_TIMEOUT))
}

impl Conn for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        self.peer_addr()
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        Conn::set_read_deadline(self, deadline)?;
        Conn::set_write_deadline(self, deadline)
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(timeout_until(deadline))
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_write_timeout(timeout_until(deadline))
    }
}
