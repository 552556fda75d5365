//! Serde-backed serializer
//!
//! Uses bincode's default (fixed-int, little-endian) configuration, which is
//! deterministic for a given type. Types containing hash maps are not: their
//! iteration order varies, so prefer `BTreeMap` in values you cache.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Deserializer, Serializer};
use crate::error::{CacheError, Result};

/// Serializer for any `serde` type
pub struct BincodeSerializer<T> {
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> BincodeSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeSerializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serializer<T> for BincodeSerializer<T> {
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| CacheError::Encoding(e.to_string()))
    }
}

impl<T: DeserializeOwned> Deserializer<T> for BincodeSerializer<T> {
    fn deserialize(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| CacheError::Encoding(e.to_string()))
    }
}
