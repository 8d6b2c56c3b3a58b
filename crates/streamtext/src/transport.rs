//! Byte transports and the close-on-exit guard.

use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
};

use tracing::{trace, warn};

/// Result of a single [`Transport::recv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were written to the front of the buffer. Zero means
    /// nothing was available right now (a non-blocking transport would
    /// block); it does not mean the stream ended.
    Data(usize),
    /// The peer closed its side; no more bytes will arrive.
    EndOfStream,
}

/// A byte-oriented duplex connection.
pub trait Transport {
    /// Writes all of `bytes` and flushes them to the peer.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the write fails.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads up to `buf.len()` bytes.
    ///
    /// Callers never pass an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the read fails. Interrupted reads
    /// are retried and never surface.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome>;

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the connection could not be shut
    /// down cleanly.
    fn close(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send(bytes)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).recv(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Maps `Read::read` results onto [`ReadOutcome`].
fn recv_from<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<ReadOutcome> {
    if buf.is_empty() {
        return Ok(ReadOutcome::Data(0));
    }
    loop {
        match reader.read(buf) {
            Ok(0) => return Ok(ReadOutcome::EndOfStream),
            Ok(n) => return Ok(ReadOutcome::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadOutcome::Data(0)),
            Err(e) => return Err(e),
        }
    }
}

impl Transport for TcpStream {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        recv_from(self, buf)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // The peer may already have torn the connection down.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Adapts any blocking `Read + Write` stream into a [`Transport`].
///
/// Closing only flushes; the stream itself is released when the adapter is
/// dropped.
#[derive(Debug)]
pub struct IoTransport<S> {
    stream: S,
}

impl<S: Read + Write> IoTransport<S> {
    /// Wraps `stream`.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> Transport for IoTransport<S> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        recv_from(&mut self.stream, buf)
    }

    fn close(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Owns a transport and closes it exactly once.
///
/// [`Connection::close`] closes explicitly and reports failures. If the
/// connection is dropped without that (an early return through `?`, or a
/// panic), the transport is closed from `Drop` and a failure is logged.
#[derive(Debug)]
pub struct Connection<T: Transport> {
    transport: T,
    closed: bool,
}

impl<T: Transport> Connection<T> {
    /// Takes ownership of an open transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            closed: false,
        }
    }

    /// The underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Closes the transport.
    ///
    /// # Errors
    ///
    /// Returns the error reported by [`Transport::close`].
    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        trace!("closing transport");
        self.transport.close()
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        trace!("closing transport on drop");
        if let Err(err) = self.transport.close() {
            warn!(%err, "failed to close transport");
        }
    }
}

/// Blocking reads for `BufRead` consumers. A would-block reads as zero bytes,
/// which `std::io` treats as end of stream.
impl<T: Transport> Read for Connection<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.transport.recv(buf)? {
            ReadOutcome::Data(n) => Ok(n),
            ReadOutcome::EndOfStream => Ok(0),
        }
    }
}
