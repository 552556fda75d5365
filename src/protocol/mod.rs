//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │  Op (1)  │ Len (4)  │         Value               │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Operations
//! - 0x01: CONTAINS       - Payload: value
//! - 0x02: ADD_IF_ABSENT  - Payload: value
//! - 0x03: REMOVE         - Payload: value
//! - 0x04: CLOSE          - Payload: empty, no response
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: FALSE
//! - 0x01: TRUE
//! - 0x02: ERROR (payload: message, connection is closed after)
//!
//! One request is in flight per connection; a client reads each response
//! before sending the next request.

mod codec;
mod handshake;
mod request;
mod response;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_VALUE_SIZE,
};
pub use handshake::{
    client_handshake, server_handshake, HandshakeReply, ABORT, MAGIC, PROTOCOL_VERSION,
    RESOURCE_OK, SUPPORTED_VERSIONS, VERSION_MISMATCH,
};
pub use request::{Operation, Request};
pub use response::{Response, Status};
