//! Full-length reads and writes over a byte transport.
//!
//! Sockets may accept or return fewer bytes than asked for. [`ByteStream`]
//! hides those short transfers: a write either delivers the whole buffer or
//! fails, and a read either returns exactly the requested length or fails.

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// Upper bound on a single transport read.
///
/// Reads accumulate in chunks of this size so that a large declared length
/// is only backed by memory as bytes actually arrive.
const READ_CHUNK: usize = 8 * 1024;

/// A transport wrapper with all-or-nothing reads and writes.
#[derive(Debug)]
pub struct ByteStream<T> {
    /// The wrapped transport.
    inner: T,
}

impl<T> ByteStream<T> {
    /// Wraps `inner`.
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Unwraps the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Write> ByteStream<T> {
    /// Writes all of `buf`, looping over partial writes, then flushes.
    ///
    /// The first transport error is returned as-is; nothing is retried
    /// except an OS-level interrupt.
    pub fn write(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.inner.write(buf) {
                Ok(0) => {
                    return Err(Error::Transport(io::Error::from(io::ErrorKind::WriteZero)));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Transport(e)),
            }
        }
        self.inner.flush().map_err(Error::Transport)
    }
}

impl<T: Read> ByteStream<T> {
    /// Reads exactly `len` bytes.
    ///
    /// Fails with [`Error::TruncatedStream`] if the transport reports
    /// end-of-data first.
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
        let mut chunk = [0u8; READ_CHUNK];
        while buf.len() < len {
            let want = (len - buf.len()).min(READ_CHUNK);
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(Error::TruncatedStream {
                        expected: len,
                        received: buf.len(),
                    });
                }
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Transport(e)),
            }
        }
        Ok(buf)
    }
}
