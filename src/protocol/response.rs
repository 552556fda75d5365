//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{CacheError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    False = 0x00,
    True = 0x01,
    Error = 0x02,
}

impl Status {
    /// Parse a status byte
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x00 => Ok(Status::False),
            0x01 => Ok(Status::True),
            0x02 => Ok(Status::Error),
            _ => Err(CacheError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                code
            ))),
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (error message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create a boolean result response
    pub fn from_bool(result: bool) -> Self {
        Self {
            status: if result { Status::True } else { Status::False },
            payload: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Interpret the response as an operation result
    ///
    /// An ERROR status becomes a protocol error carrying the server's message.
    pub fn into_bool(self) -> Result<bool> {
        match self.status {
            Status::True => Ok(true),
            Status::False => Ok(false),
            Status::Error => {
                let message = self
                    .payload
                    .map(|p| String::from_utf8_lossy(&p).into_owned())
                    .unwrap_or_default();
                Err(CacheError::Protocol(format!("server error: {}", message)))
            }
        }
    }
}
