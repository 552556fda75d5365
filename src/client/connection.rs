//! Client-side connection
//!
//! One handshaken TCP stream to the server.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};

use crate::config::{timeout_from_ms, ClientConfig};
use crate::error::{CacheError, Result};
use crate::protocol::{
    client_handshake, read_response, write_request, Request, Response, SUPPORTED_VERSIONS,
};

/// A connection ready to carry requests
pub struct ClientConnection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl ClientConnection {
    /// Connect to the configured server and run the handshake
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let stream = connect(config)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout_from_ms(config.read_timeout_ms))?;
        stream.set_write_timeout(timeout_from_ms(config.write_timeout_ms))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);
        let version = client_handshake(&mut reader, &mut writer, SUPPORTED_VERSIONS)?;

        tracing::debug!(
            "Connected to {} (protocol v{})",
            config.server_addr(),
            version
        );

        Ok(Self { reader, writer })
    }

    /// Send one request and block for its response
    pub fn execute(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)
    }

    /// Announce an orderly disconnect and drop the stream
    pub fn close(mut self) {
        let _ = write_request(&mut self.writer, &Request::Close);
    }

    /// Whether the server still has this connection open
    ///
    /// Checks without blocking. A connection with unread bytes is out of
    /// step with the server and counts as closed.
    pub fn is_open(&self) -> bool {
        if !self.reader.buffer().is_empty() {
            return false;
        }

        let stream = self.reader.get_ref();
        if stream.set_nonblocking(true).is_err() {
            return false;
        }
        let mut buf = [0u8; 1];
        let idle = match stream.peek(&mut buf) {
            Err(e) => e.kind() == ErrorKind::WouldBlock,
            // EOF, or bytes nobody asked for
            Ok(_) => false,
        };
        stream.set_nonblocking(false).is_ok() && idle
    }
}

/// Try each resolved address in turn
fn connect(config: &ClientConfig) -> Result<TcpStream> {
    let addr = config.server_addr();
    let addrs = addr
        .to_socket_addrs()
        .map_err(|e| CacheError::Connection(format!("cannot resolve {}: {}", addr, e)))?;

    let mut last_err = None;
    for socket_addr in addrs {
        let attempt = match timeout_from_ms(config.connect_timeout_ms) {
            Some(timeout) => TcpStream::connect_timeout(&socket_addr, timeout),
            None => TcpStream::connect(socket_addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(CacheError::Connection(match last_err {
        Some(e) => format!("cannot connect to {}: {}", addr, e),
        None => format!("{} resolved to no addresses", addr),
    }))
}
