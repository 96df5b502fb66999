//! The byte-stream boundary a session writes to.

use std::io::{self, ErrorKind, Write};
use std::net::{Shutdown, TcpStream};

/// An ordered, reliable byte stream.
///
/// Inbound data is delivered separately (see
/// [`Session::receive`](crate::Session::receive)); a session only needs to
/// write and to tear the stream down.
pub trait Transport {
    /// Queue bytes for delivery.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Graceful shutdown: flush pending writes, then close the write half.
    fn end(&mut self) -> io::Result<()>;

    /// Immediate shutdown of both directions.
    fn destroy(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn end(&mut self) -> io::Result<()> {
        (**self).end()
    }

    fn destroy(&mut self) -> io::Result<()> {
        (**self).destroy()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn end(&mut self) -> io::Result<()> {
        (**self).end()
    }

    fn destroy(&mut self) -> io::Result<()> {
        (**self).destroy()
    }
}

impl Transport for TcpStream {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_all(self, bytes)
    }

    fn end(&mut self) -> io::Result<()> {
        flush(self)?;
        ignore_not_connected(self.shutdown(Shutdown::Write))
    }

    fn destroy(&mut self) -> io::Result<()> {
        ignore_not_connected(self.shutdown(Shutdown::Both))
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_all(self, bytes)
    }

    fn end(&mut self) -> io::Result<()> {
        flush(self)?;
        ignore_not_connected(self.shutdown(Shutdown::Write))
    }

    fn destroy(&mut self) -> io::Result<()> {
        ignore_not_connected(self.shutdown(Shutdown::Both))
    }
}

fn write_all<W: Write>(inner: &mut W, bytes: &[u8]) -> io::Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero)),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(err),
        }
    }
    flush(inner)
}

fn flush<W: Write>(inner: &mut W) -> io::Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(err),
        }
    }
}

// A peer that already hung up is as closed as we wanted it.
fn ignore_not_connected(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
        other => other,
    }
}
