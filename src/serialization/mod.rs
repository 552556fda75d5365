//! Serialization Module
//!
//! Turns application values into the opaque bytes the cache stores.
//!
//! ## Contract
//! - A `Serializer<T>` maps a value to bytes, or fails with `CacheError::Encoding`
//! - Encoding must be deterministic: equal values produce equal bytes, because
//!   byte equality is the only identity the server knows about
//! - A `Deserializer<T>` is the inverse; only clients ever decode
//!
//! Any `Fn(&T) -> Result<Vec<u8>>` is a serializer, so callers can pass a
//! closure instead of defining a type.

mod bincode_serializer;
mod string;

pub use bincode_serializer::BincodeSerializer;
pub use string::{AsciiSerializer, BytesSerializer, StringSerializer};

use crate::error::Result;

/// Encodes values of type `T` into cache bytes
pub trait Serializer<T: ?Sized> {
    /// Serialize a value into its byte form
    fn serialize(&self, value: &T) -> Result<Vec<u8>>;
}

/// Decodes cache bytes back into values of type `T`
pub trait Deserializer<T> {
    /// Deserialize a value from its byte form
    fn deserialize(&self, bytes: &[u8]) -> Result<T>;
}

impl<T, F> Serializer<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Result<Vec<u8>>,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        self(value)
    }
}
