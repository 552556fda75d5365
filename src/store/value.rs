//! Cached value representation

use std::fmt;

use bytes::Bytes;

/// An opaque, encoded value
///
/// Two values are equal iff their bytes are equal.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct CacheValue(Bytes);

impl CacheValue {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<Bytes> for CacheValue {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<&'static [u8]> for CacheValue {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}

impl AsRef<[u8]> for CacheValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values can be large; show a bounded prefix
        const PREVIEW: usize = 32;
        if self.0.len() <= PREVIEW {
            write!(f, "CacheValue({:?})", self.0)
        } else {
            write!(
                f,
                "CacheValue({:?}.. {} bytes)",
                self.0.slice(..PREVIEW),
                self.0.len()
            )
        }
    }
}
