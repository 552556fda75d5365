//! Store Module
//!
//! The server-side authoritative set of cached values.
//!
//! ## Responsibilities
//! - Byte-equality membership (never interprets value contents)
//! - Atomic add-if-absent and remove per value
//! - Safe sharing across all connection workers
//!
//! ## Data Structure Choice
//! A fixed array of shards, each a `HashSet` behind a parking_lot `RwLock`.
//! A value always hashes to the same shard, so the three operations on one
//! value are serialized by that shard's lock. Operations never span values,
//! so no cross-shard locking exists.

mod set;
mod value;

pub use set::CacheSet;
pub use value::CacheValue;
