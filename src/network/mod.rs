//! Network Module
//!
//! TCP server and connection handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polled for shutdown)
//! - One worker thread per connection
//! - Requests dispatched straight to the shared `CacheSet`

mod connection;
mod server;

pub use connection::{dispatch, Connection};
pub use server::Server;
