//! Connection handshake
//!
//! Runs once per connection, before the first request frame.
//!
//! ```text
//! client → server:  magic "DSET" (4) + version (4)
//! server → client:  RESOURCE_OK (1)
//!                 | VERSION_MISMATCH (1) + preferred version (4)
//!                 | ABORT (1) + reason_len (4) + reason
//! ```
//!
//! After a mismatch the client may propose the server's preferred version;
//! the server keeps answering until it accepts, aborts, or the round limit
//! is hit.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{CacheError, Result};

/// Magic bytes opening every connection
pub const MAGIC: &[u8; 4] = b"DSET";

/// Current protocol version
pub const PROTOCOL_VERSION: u32 = 1;

/// Versions this build can speak, newest last
pub const SUPPORTED_VERSIONS: &[u32] = &[PROTOCOL_VERSION];

pub const RESOURCE_OK: u8 = 0x14;
pub const VERSION_MISMATCH: u8 = 0x15;
pub const ABORT: u8 = 0xFF;

/// Max proposals the server entertains from one client
const MAX_NEGOTIATION_ROUNDS: usize = 4;

/// Max abort reason length accepted by the client
const MAX_REASON_LEN: usize = 4096;

/// Server's answer to a version proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeReply {
    Accepted,
    VersionMismatch(u32),
    Abort(String),
}

/// Highest supported version not above `requested`
fn preferred_version(supported: &[u32], requested: u32) -> Option<u32> {
    supported.iter().copied().filter(|v| *v <= requested).max()
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn write_reply<W: Write>(writer: &mut W, reply: &HandshakeReply) -> Result<()> {
    let mut buf = BytesMut::new();
    match reply {
        HandshakeReply::Accepted => buf.put_u8(RESOURCE_OK),
        HandshakeReply::VersionMismatch(version) => {
            buf.put_u8(VERSION_MISMATCH);
            buf.put_u32(*version);
        }
        HandshakeReply::Abort(reason) => {
            buf.put_u8(ABORT);
            buf.put_u32(reason.len() as u32);
            buf.put_slice(reason.as_bytes());
        }
    }
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

fn read_reply<R: Read>(reader: &mut R) -> Result<HandshakeReply> {
    let mut code = [0u8; 1];
    reader.read_exact(&mut code)?;

    match code[0] {
        RESOURCE_OK => Ok(HandshakeReply::Accepted),
        VERSION_MISMATCH => Ok(HandshakeReply::VersionMismatch(read_u32(reader)?)),
        ABORT => {
            let len = read_u32(reader)? as usize;
            if len > MAX_REASON_LEN {
                return Err(CacheError::Protocol(format!(
                    "Abort reason too long: {} bytes",
                    len
                )));
            }
            let mut reason = vec![0u8; len];
            reader.read_exact(&mut reason)?;
            Ok(HandshakeReply::Abort(
                String::from_utf8_lossy(&reason).into_owned(),
            ))
        }
        other => Err(CacheError::Protocol(format!(
            "Unknown handshake reply: 0x{:02x}",
            other
        ))),
    }
}

/// Server side of the handshake
///
/// Returns the negotiated version. Bad magic gets an ABORT reply and a
/// protocol error.
pub fn server_handshake<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    supported: &[u32],
) -> Result<u32> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        let reason = format!("bad magic bytes {:02x?}", magic);
        // Best effort; the connection closes either way
        let _ = write_reply(writer, &HandshakeReply::Abort(reason.clone()));
        return Err(CacheError::Protocol(reason));
    }

    for _ in 0..MAX_NEGOTIATION_ROUNDS {
        let requested = read_u32(reader)?;

        if supported.contains(&requested) {
            write_reply(writer, &HandshakeReply::Accepted)?;
            return Ok(requested);
        }

        match preferred_version(supported, requested) {
            Some(version) => {
                write_reply(writer, &HandshakeReply::VersionMismatch(version))?;
            }
            None => {
                let reason = format!("no compatible version for {}", requested);
                let _ = write_reply(writer, &HandshakeReply::Abort(reason.clone()));
                return Err(CacheError::Protocol(reason));
            }
        }
    }

    let reason = "version negotiation did not converge".to_string();
    let _ = write_reply(writer, &HandshakeReply::Abort(reason.clone()));
    Err(CacheError::Protocol(reason))
}

/// Client side of the handshake
///
/// Proposes the newest supported version and follows the server's counter
/// proposal if it is one we speak. Returns the negotiated version.
pub fn client_handshake<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    supported: &[u32],
) -> Result<u32> {
    let mut version = supported
        .iter()
        .copied()
        .max()
        .ok_or_else(|| CacheError::Config("no protocol versions configured".to_string()))?;

    let mut opening = BytesMut::with_capacity(8);
    opening.put_slice(MAGIC);
    opening.put_u32(version);
    writer.write_all(&opening)?;
    writer.flush()?;

    let mut tried = vec![version];
    loop {
        match read_reply(reader)? {
            HandshakeReply::Accepted => return Ok(version),
            HandshakeReply::VersionMismatch(proposed) => {
                if !supported.contains(&proposed) || tried.contains(&proposed) {
                    return Err(CacheError::Protocol(format!(
                        "server requires unsupported protocol version {}",
                        proposed
                    )));
                }
                version = proposed;
                tried.push(version);
                writer.write_all(&version.to_be_bytes())?;
                writer.flush()?;
            }
            HandshakeReply::Abort(reason) => {
                return Err(CacheError::Protocol(format!(
                    "server aborted handshake: {}",
                    reason
                )))
            }
        }
    }
}
