//! Request definitions
//!
//! Represents operations sent by clients.

use crate::error::{CacheError, Result};
use crate::store::CacheValue;

/// Operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Contains = 0x01,
    AddIfAbsent = 0x02,
    Remove = 0x03,
    Close = 0x04,
}

impl Operation {
    /// Parse an operation byte
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x01 => Ok(Operation::Contains),
            0x02 => Ok(Operation::AddIfAbsent),
            0x03 => Ok(Operation::Remove),
            0x04 => Ok(Operation::Close),
            _ => Err(CacheError::Protocol(format!(
                "Unknown operation code: 0x{:02x}",
                code
            ))),
        }
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Membership test
    Contains { value: CacheValue },

    /// Insert if not already present
    AddIfAbsent { value: CacheValue },

    /// Delete if present
    Remove { value: CacheValue },

    /// Orderly disconnect, no response is sent
    Close,
}

impl Request {
    /// Build a value-carrying request
    ///
    /// `Operation::Close` carries no value; the value is dropped.
    pub fn new(operation: Operation, value: CacheValue) -> Self {
        match operation {
            Operation::Contains => Request::Contains { value },
            Operation::AddIfAbsent => Request::AddIfAbsent { value },
            Operation::Remove => Request::Remove { value },
            Operation::Close => Request::Close,
        }
    }

    /// Get the operation code
    pub fn operation(&self) -> Operation {
        match self {
            Request::Contains { .. } => Operation::Contains,
            Request::AddIfAbsent { .. } => Operation::AddIfAbsent,
            Request::Remove { .. } => Operation::Remove,
            Request::Close => Operation::Close,
        }
    }

    /// The value carried by this request, if any
    pub fn value(&self) -> Option<&CacheValue> {
        match self {
            Request::Contains { value }
            | Request::AddIfAbsent { value }
            | Request::Remove { value } => Some(value),
            Request::Close => None,
        }
    }
}
