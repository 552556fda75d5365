//! Handshake Tests
//!
//! Drives both sides of the version negotiation over in-memory buffers.

use std::io::Cursor;

use setcache::error::CacheError;
use setcache::protocol::{
    client_handshake, server_handshake, ABORT, MAGIC, PROTOCOL_VERSION, RESOURCE_OK,
    VERSION_MISMATCH,
};

fn opening(version: u32) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&version.to_be_bytes());
    bytes
}

// =============================================================================
// Server Side
// =============================================================================

#[test]
fn test_server_accepts_supported_version() {
    let mut input = Cursor::new(opening(PROTOCOL_VERSION));
    let mut output = Vec::new();

    let version = server_handshake(&mut input, &mut output, &[1]).unwrap();

    assert_eq!(version, PROTOCOL_VERSION);
    assert_eq!(output, vec![RESOURCE_OK]);
}

#[test]
fn test_server_aborts_on_bad_magic() {
    let mut input = Cursor::new(b"HTTP\x00\x00\x00\x01".to_vec());
    let mut output = Vec::new();

    let err = server_handshake(&mut input, &mut output, &[1]).unwrap_err();

    assert!(matches!(err, CacheError::Protocol(_)));
    assert_eq!(output[0], ABORT);
}

#[test]
fn test_server_counter_proposes_lower_version() {
    // Client asks for 3, server speaks 1 and 2, client then accepts 2
    let mut bytes = opening(3);
    bytes.extend_from_slice(&2u32.to_be_bytes());
    let mut input = Cursor::new(bytes);
    let mut output = Vec::new();

    let version = server_handshake(&mut input, &mut output, &[1, 2]).unwrap();

    assert_eq!(version, 2);
    assert_eq!(output, vec![VERSION_MISMATCH, 0, 0, 0, 2, RESOURCE_OK]);
}

#[test]
fn test_server_aborts_when_no_version_is_low_enough() {
    let mut input = Cursor::new(opening(1));
    let mut output = Vec::new();

    let err = server_handshake(&mut input, &mut output, &[2, 3]).unwrap_err();

    assert!(err.to_string().contains("no compatible version"));
    assert_eq!(output[0], ABORT);
}

// =============================================================================
// Client Side
// =============================================================================

#[test]
fn test_client_sends_magic_and_version() {
    let mut input = Cursor::new(vec![RESOURCE_OK]);
    let mut output = Vec::new();

    let version = client_handshake(&mut input, &mut output, &[1]).unwrap();

    assert_eq!(version, 1);
    assert_eq!(output, opening(1));
}

#[test]
fn test_client_follows_supported_counter_proposal() {
    let mut input = Cursor::new(vec![VERSION_MISMATCH, 0, 0, 0, 1, RESOURCE_OK]);
    let mut output = Vec::new();

    let version = client_handshake(&mut input, &mut output, &[1, 2]).unwrap();

    assert_eq!(version, 1);
    let mut expected = opening(2);
    expected.extend_from_slice(&1u32.to_be_bytes());
    assert_eq!(output, expected);
}

#[test]
fn test_client_rejects_unsupported_counter_proposal() {
    let mut input = Cursor::new(vec![VERSION_MISMATCH, 0, 0, 0, 7]);
    let mut output = Vec::new();

    let err = client_handshake(&mut input, &mut output, &[1]).unwrap_err();

    assert!(matches!(err, CacheError::Protocol(_)));
}

#[test]
fn test_client_reports_abort_reason() {
    let reason = b"go away";
    let mut reply = vec![ABORT];
    reply.extend_from_slice(&(reason.len() as u32).to_be_bytes());
    reply.extend_from_slice(reason);
    let mut input = Cursor::new(reply);
    let mut output = Vec::new();

    let err = client_handshake(&mut input, &mut output, &[1]).unwrap_err();

    assert!(err.to_string().contains("go away"));
}

#[test]
fn test_client_eof_is_io_error() {
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();

    let err = client_handshake(&mut input, &mut output, &[1]).unwrap_err();

    assert!(err.is_connection());
}
