//! # SetCache
//!
//! A network-accessible distributed set cache with:
//! - An in-memory, sharded set of opaque byte values
//! - Atomic contains / add-if-absent / remove per value
//! - A compact length-prefixed binary protocol over TCP
//! - Pluggable value serializers on the client side
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            SetCacheClient (Serializer<T> → bytes)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  handshake, then request/response frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      TCP Server                              │
//! │           (one worker thread per connection)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  dispatch(op, value)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      CacheSet                                │
//! │              (sharded HashSet, RwLock per shard)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod network;
pub mod protocol;
pub mod serialization;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::SetCacheClient;
pub use config::{ClientConfig, ServerConfig, DEFAULT_PORT};
pub use error::{CacheError, Result};
pub use network::Server;
pub use serialization::{Deserializer, Serializer, StringSerializer};
pub use store::{CacheSet, CacheValue};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SetCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
