//! Text and raw byte serializers

use super::{Deserializer, Serializer};
use crate::error::{CacheError, Result};

/// UTF-8 string serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl Serializer<str> for StringSerializer {
    fn serialize(&self, value: &str) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }
}

impl Serializer<String> for StringSerializer {
    fn serialize(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }
}

impl Deserializer<String> for StringSerializer {
    fn deserialize(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CacheError::Encoding(format!("invalid UTF-8: {}", e)))
    }
}

/// Strict 7-bit ASCII serializer
///
/// Rejects any string containing a non-ASCII character instead of
/// substituting it, so two distinct strings never collide on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiSerializer;

impl AsciiSerializer {
    fn encode(value: &str) -> Result<Vec<u8>> {
        match value.char_indices().find(|(_, c)| !c.is_ascii()) {
            Some((pos, c)) => Err(CacheError::Encoding(format!(
                "non-ASCII character {:?} at byte {}",
                c, pos
            ))),
            None => Ok(value.as_bytes().to_vec()),
        }
    }
}

impl Serializer<str> for AsciiSerializer {
    fn serialize(&self, value: &str) -> Result<Vec<u8>> {
        Self::encode(value)
    }
}

impl Serializer<String> for AsciiSerializer {
    fn serialize(&self, value: &String) -> Result<Vec<u8>> {
        Self::encode(value)
    }
}

impl Deserializer<String> for AsciiSerializer {
    fn deserialize(&self, bytes: &[u8]) -> Result<String> {
        if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
            return Err(CacheError::Encoding(format!(
                "non-ASCII byte 0x{:02x} at {}",
                bytes[pos], pos
            )));
        }
        // All bytes are ASCII, which is valid UTF-8
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CacheError::Encoding(e.to_string()))
    }
}

/// Identity serializer for values that are already bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl Serializer<[u8]> for BytesSerializer {
    fn serialize(&self, value: &[u8]) -> Result<Vec<u8>> {
        Ok(value.to_vec())
    }
}

impl Serializer<Vec<u8>> for BytesSerializer {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }
}

impl Deserializer<Vec<u8>> for BytesSerializer {
    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
