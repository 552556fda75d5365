//! Client Module
//!
//! Blocking client for a SetCache server.
//!
//! ## Call Flow
//! 1. Encode the value with the caller's `Serializer`
//! 2. Borrow an idle pooled connection the server has not closed, or open
//!    (and handshake) a new one
//! 3. Send the request frame and block for the response frame
//! 4. Return the connection to the pool on success, discard it on failure
//!
//! Transport failures are returned as `CacheError::Connection`; nothing is
//! retried automatically.

mod connection;

pub use connection::ClientConnection;

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::queue::ArrayQueue;

use crate::config::ClientConfig;
use crate::error::{CacheError, Result};
use crate::protocol::{Operation, Request, Status, MAX_VALUE_SIZE};
use crate::serialization::Serializer;
use crate::store::CacheValue;

/// Map raw transport failures into connection errors
fn connection_error(err: CacheError) -> CacheError {
    match err {
        CacheError::Io(e) => CacheError::Connection(e.to_string()),
        other => other,
    }
}

/// Client for the distributed set cache
///
/// Safe to share across threads; each concurrent call uses its own
/// connection.
pub struct SetCacheClient {
    config: ClientConfig,
    enabled: AtomicBool,
    idle: ArrayQueue<ClientConnection>,
}

impl SetCacheClient {
    /// Create an enabled client
    ///
    /// No connection is opened until the first operation.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.hostname.is_empty() {
            return Err(CacheError::Config("hostname must not be empty".to_string()));
        }
        if config.pool_size == 0 {
            return Err(CacheError::Config(
                "pool_size must be at least 1".to_string(),
            ));
        }

        let idle = ArrayQueue::new(config.pool_size);
        Ok(Self {
            config,
            enabled: AtomicBool::new(true),
            idle,
        })
    }

    /// Allow operations again after `disable`
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            tracing::debug!("Client for {} enabled", self.config.server_addr());
        }
    }

    /// Close idle connections and reject further operations
    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            self.drain_idle();
            tracing::debug!("Client for {} disabled", self.config.server_addr());
        }
    }

    /// Whether operations are currently allowed
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// True iff the server currently holds `value`
    pub fn contains<T, S>(&self, value: &T, serializer: &S) -> Result<bool>
    where
        T: ?Sized,
        S: Serializer<T>,
    {
        self.call(Operation::Contains, value, serializer)
    }

    /// Add `value` unless present; true iff this call added it
    pub fn add_if_absent<T, S>(&self, value: &T, serializer: &S) -> Result<bool>
    where
        T: ?Sized,
        S: Serializer<T>,
    {
        self.call(Operation::AddIfAbsent, value, serializer)
    }

    /// Remove `value` if present; true iff this call removed it
    pub fn remove<T, S>(&self, value: &T, serializer: &S) -> Result<bool>
    where
        T: ?Sized,
        S: Serializer<T>,
    {
        self.call(Operation::Remove, value, serializer)
    }

    /// Number of idle pooled connections
    pub fn idle_connections(&self) -> usize {
        self.idle.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn call<T, S>(&self, operation: Operation, value: &T, serializer: &S) -> Result<bool>
    where
        T: ?Sized,
        S: Serializer<T>,
    {
        if !self.is_enabled() {
            return Err(CacheError::Connection("client is disabled".to_string()));
        }

        // Encoding failures never reach the wire
        let bytes = serializer.serialize(value)?;
        if bytes.len() > MAX_VALUE_SIZE as usize {
            return Err(CacheError::Encoding(format!(
                "encoded value is {} bytes (max {})",
                bytes.len(),
                MAX_VALUE_SIZE
            )));
        }
        let request = Request::new(operation, CacheValue::from(bytes));

        let mut conn = self.checkout()?;

        let response = match conn.execute(&request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Dropping connection after {:?} failed: {}", operation, e);
                return Err(connection_error(e));
            }
        };
        tracing::trace!("{:?} -> {:?}", operation, response.status);

        // The server closes the connection after an ERROR response
        if response.status != Status::Error {
            self.release(conn);
        }

        response.into_bool()
    }

    /// Take a live pooled connection, or open a new one
    ///
    /// Pooled connections the server has since closed (idle timeout,
    /// restart) are dropped here, before any request is written.
    fn checkout(&self) -> Result<ClientConnection> {
        while let Some(conn) = self.idle.pop() {
            if conn.is_open() {
                return Ok(conn);
            }
            tracing::debug!(
                "Discarding pooled connection to {} closed by the server",
                self.config.server_addr()
            );
        }
        ClientConnection::open(&self.config).map_err(connection_error)
    }

    fn release(&self, conn: ClientConnection) {
        if !self.is_enabled() {
            conn.close();
            return;
        }
        if let Err(conn) = self.idle.push(conn) {
            conn.close();
        }
    }

    fn drain_idle(&self) {
        while let Some(conn) = self.idle.pop() {
            conn.close();
        }
    }
}

impl Drop for SetCacheClient {
    fn drop(&mut self) {
        self.drain_idle();
    }
}
