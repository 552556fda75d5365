//! Connection Handler
//!
//! Handles individual client connections.
//!
//! ## Lifecycle
//! ```text
//! handshake ─► read frame ─► dispatch ─► write response ─┐
//!                  ▲                                     │
//!                  └─────────────────────────────────────┘
//!   EOF / CLOSE / protocol error / I/O error ─► closed
//! ```

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;

use crate::config::timeout_from_ms;
use crate::error::{CacheError, Result};
use crate::protocol::{read_request, server_handshake, write_response, Request, Response};
use crate::protocol::SUPPORTED_VERSIONS;
use crate::store::CacheSet;

/// Apply a request to the store
///
/// `Close` has no response and is handled by the connection loop.
pub fn dispatch(store: &CacheSet, request: Request) -> Option<Response> {
    let result = match request {
        Request::Contains { value } => store.contains(&value),
        Request::AddIfAbsent { value } => store.add_if_absent(value),
        Request::Remove { value } => store.remove(&value),
        Request::Close => return None,
    };
    Some(Response::from_bool(result))
}

/// Whether an I/O error just means the peer went away
fn is_disconnect(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
    )
}

/// Whether an I/O error is a socket timeout (WouldBlock on Unix, TimedOut on Windows)
fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared cache store
    store: Arc<CacheSet>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, store: Arc<CacheSet>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables a timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout_from_ms(read_ms))?;
        self.writer.get_ref().set_write_timeout(timeout_from_ms(write_ms))?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Performs the handshake, then serves requests until the client
    /// disconnects or sends a malformed frame. Disconnects are `Ok`; protocol
    /// and other I/O failures are returned after the connection is closed.
    pub fn handle(&mut self) -> Result<()> {
        match self.serve() {
            Err(CacheError::Io(ref e)) if is_disconnect(e) => {
                tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                Ok(())
            }
            Err(CacheError::Io(ref e)) if is_timeout(e) => {
                tracing::debug!("Read timeout for client {}", self.peer_addr);
                Ok(())
            }
            other => other,
        }
    }

    fn serve(&mut self) -> Result<()> {
        let version = server_handshake(&mut self.reader, &mut self.writer, SUPPORTED_VERSIONS)?;
        tracing::debug!(
            "Connection established from {} (protocol v{})",
            self.peer_addr,
            version
        );

        loop {
            let request = match read_request(&mut self.reader) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e @ CacheError::Protocol(_)) => {
                    tracing::warn!("Protocol error from {}: {}", self.peer_addr, e);
                    // Tell the client why before closing, if it is still listening
                    let _ = write_response(&mut self.writer, &Response::error(&e.to_string()));
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let response = match dispatch(&self.store, request) {
                Some(response) => response,
                None => {
                    tracing::debug!("Client {} closed the session", self.peer_addr);
                    return Ok(());
                }
            };

            write_response(&mut self.writer, &response)?;
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
