//! Error types for SetCache
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for SetCache operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Encoding Errors (client-local, never sent over the wire)
    // -------------------------------------------------------------------------
    #[error("Encoding error: {0}")]
    Encoding(String),

    // -------------------------------------------------------------------------
    // Protocol Errors (fatal to the connection they occur on)
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Connection Errors (surfaced to the caller of the in-flight operation)
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether this error came from the transport (refused, reset, EOF)
    pub fn is_connection(&self) -> bool {
        matches!(self, CacheError::Io(_) | CacheError::Connection(_))
    }
}
