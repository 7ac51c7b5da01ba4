//! Connections to the lottery server and run cancellation.
//!
//! Every exchange opens its own connection through a [`Connect`]
//! implementation. [`TcpConnector`] registers each live socket with a
//! [`ShutdownHandle`], so another thread can abort a blocked read or write
//! by shutting the socket down.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Opens a fresh byte stream to the server.
pub trait Connect {
    /// Stream type produced per connection.
    type Stream: Read + Write;

    /// Opens a new connection.
    fn connect(&self) -> io::Result<Self::Stream>;
}

/// Cancellation flag shared between a client and whoever may stop it.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    /// Shared state.
    inner: Arc<Shared>,
}

/// State behind a [`ShutdownHandle`].
#[derive(Debug, Default)]
struct Shared {
    /// Flag and in-flight socket.
    state: Mutex<State>,
    /// Wakes threads sleeping in [`ShutdownHandle::sleep`].
    wake: Condvar,
}

/// Mutable part of [`Shared`].
#[derive(Debug, Default)]
struct State {
    /// Set once by [`ShutdownHandle::shutdown`].
    cancelled: bool,
    /// Clone of the in-flight socket, if any.
    active: Option<TcpStream>,
}

impl ShutdownHandle {
    /// Creates a handle that is not shut down.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the run: shuts down the in-flight socket and wakes any
    /// pending poll wait. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.cancelled = true;
        if let Some(stream) = state.active.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        drop(state);
        self.inner.wake.notify_all();
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.lock().cancelled
    }

    /// Sleeps for `duration` unless shut down first.
    ///
    /// Returns `true` if the handle was shut down.
    pub fn sleep(&self, duration: Duration) -> bool {
        let guard = self.lock();
        let (state, _) = self
            .inner
            .wake
            .wait_timeout_while(guard, duration, |s| !s.cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        state.cancelled
    }

    /// Registers `stream` as the in-flight socket.
    fn track(&self, stream: &TcpStream) -> io::Result<()> {
        let mut state = self.lock();
        if state.cancelled {
            let _ = stream.shutdown(Shutdown::Both);
            return Err(cancelled());
        }
        state.active = Some(stream.try_clone()?);
        Ok(())
    }

    /// Forgets the in-flight socket.
    fn untrack(&self) {
        self.lock().active = None;
    }

    /// Locks the shared state, ignoring poisoning.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// The error a connector reports after shutdown.
fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "shutdown requested")
}

/// Dials the server over TCP, one blocking connection per exchange.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    /// `host:port` to dial.
    address: String,
    /// Where live sockets are registered.
    shutdown: ShutdownHandle,
}

impl TcpConnector {
    /// Creates a connector for `address`.
    pub fn new(address: impl Into<String>, shutdown: ShutdownHandle) -> Self {
        Self {
            address: address.into(),
            shutdown,
        }
    }
}

impl Connect for TcpConnector {
    type Stream = TcpConnection;

    fn connect(&self) -> io::Result<TcpConnection> {
        if self.shutdown.is_shutdown() {
            return Err(cancelled());
        }
        let stream = TcpStream::connect(&self.address)?;
        self.shutdown.track(&stream)?;
        Ok(TcpConnection {
            stream,
            shutdown: self.shutdown.clone(),
        })
    }
}

/// A TCP connection registered with a [`ShutdownHandle`] while alive.
#[derive(Debug)]
pub struct TcpConnection {
    /// The socket.
    stream: TcpStream,
    /// Handle to unregister from on drop.
    shutdown: ShutdownHandle,
}

impl Read for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.shutdown.untrack();
    }
}
