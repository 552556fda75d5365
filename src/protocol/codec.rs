//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │  Op (1)  │ Len (4)  │         Value               │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Lengths are big-endian u32.

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, BytesMut};

use super::{Operation, Request, Response, Status};
use crate::error::{CacheError, Result};
use crate::store::CacheValue;

/// Header size: 1 byte op/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum value/payload size (16 MB)
pub const MAX_VALUE_SIZE: u32 = 16 * 1024 * 1024;

/// Reject payloads the length field cannot describe
fn check_payload_len(len: usize) -> Result<()> {
    if len > MAX_VALUE_SIZE as usize {
        return Err(CacheError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

fn encode_frame(code: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(code);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

fn parse_header(header: &[u8]) -> Result<(u8, usize)> {
    let code = header[0];
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

    if len > MAX_VALUE_SIZE {
        return Err(CacheError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_VALUE_SIZE
        )));
    }

    Ok((code, len as usize))
}

/// Split a complete frame into (code, payload)
fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(CacheError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let (code, payload_len) = parse_header(&bytes[..HEADER_SIZE])?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(CacheError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((code, &bytes[HEADER_SIZE..total_len]))
}

fn build_request(operation: Operation, payload: Vec<u8>) -> Result<Request> {
    if operation == Operation::Close && !payload.is_empty() {
        return Err(CacheError::Protocol(format!(
            "CLOSE request: unexpected payload of {} bytes",
            payload.len()
        )));
    }
    Ok(Request::new(operation, CacheValue::from(payload)))
}

fn build_response(status: Status, payload: Vec<u8>) -> Response {
    let payload = if payload.is_empty() { None } else { Some(payload) };
    Response { status, payload }
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Format: op (1) + value_len (4) + value
///
/// The value is not size-checked here; `write_request` rejects values over
/// `MAX_VALUE_SIZE` before encoding.
pub fn encode_request(request: &Request) -> Vec<u8> {
    let value = request.value().map(CacheValue::as_bytes).unwrap_or(&[]);
    encode_frame(request.operation() as u8, value)
}

/// Decode a request from a complete frame
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (code, payload) = split_frame(bytes)?;
    let operation = Operation::from_code(code)?;
    build_request(operation, payload.to_vec())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    encode_frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (code, payload) = split_frame(bytes)?;
    let status = Status::from_code(code)?;
    Ok(build_response(status, payload.to_vec()))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Builds the error for a stream that ends inside a frame
type Truncated = fn(String) -> CacheError;

/// Read a frame header
///
/// Returns `None` if the stream ended cleanly before the first byte.
fn read_header<R: Read>(
    reader: &mut R,
    truncated: Truncated,
) -> Result<Option<[u8; HEADER_SIZE]>> {
    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;

    while filled < HEADER_SIZE {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(truncated(format!(
                    "Truncated header: got {} of {} bytes",
                    filled, HEADER_SIZE
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(header))
}

/// Read exactly `len` payload bytes
///
/// The buffer grows as data arrives, so a lying length field cannot force a
/// large allocation up front.
fn read_payload<R: Read>(reader: &mut R, len: usize, truncated: Truncated) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    if len > 0 {
        reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
    }

    if payload.len() < len {
        return Err(truncated(format!(
            "Truncated payload: declared {} bytes, got {}",
            len,
            payload.len()
        )));
    }

    Ok(payload)
}

/// Read a complete request from a stream
///
/// Blocks until a complete request is received. Returns `None` when the
/// peer closed the stream between frames; a stream that ends inside a frame
/// is a protocol error.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Option<Request>> {
    let header = match read_header(reader, CacheError::Protocol)? {
        Some(header) => header,
        None => return Ok(None),
    };

    let (code, payload_len) = parse_header(&header)?;

    // Reject unknown operations before consuming the payload
    let operation = Operation::from_code(code)?;
    let payload = read_payload(reader, payload_len, CacheError::Protocol)?;

    build_request(operation, payload).map(Some)
}

/// Write a request to a stream
///
/// Values over `MAX_VALUE_SIZE` are rejected before anything is written.
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    check_payload_len(request.value().map_or(0, CacheValue::len))?;
    let bytes = encode_request(request);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
///
/// A stream that ends before or inside the response is a connection error:
/// the server went away mid-exchange.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let header = read_header(reader, CacheError::Connection)?.ok_or_else(|| {
        CacheError::Connection("server closed the connection".to_string())
    })?;

    let (code, payload_len) = parse_header(&header)?;
    let status = Status::from_code(code)?;
    let payload = read_payload(reader, payload_len, CacheError::Connection)?;

    Ok(build_response(status, payload))
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    check_payload_len(response.payload.as_ref().map_or(0, Vec::len))?;
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
