//! Wire format encoding and decoding.
//!
//! Implements the gateway frame layout:
//! ```text
//! ┌─────────┬────────┬──────────┬───────────────┬──────────┐
//! │ Version │ Length │ Command  │ Payload       │ Checksum │
//! │ 1 byte  │ 1 byte │ 2 bytes  │ 0..250 bytes  │ 1 byte   │
//! │ (0x00)  │        │ uint16 BE│               │ XOR      │
//! └─────────┴────────┴──────────┴───────────────┴──────────┘
//! ```
//!
//! `Length` counts every byte after itself (command code, payload and
//! checksum), so `length == 3 + payload.len()`. `Checksum` is the XOR
//! fold of every preceding byte. Frames are SLIP-escaped for the wire
//! after assembly; decoding here expects already-unescaped input.

use bytes::Bytes;

use crate::error::{FrameError, GatewayError, Result};

use super::Frame;

/// The single supported protocol version.
pub const PROTOCOL_VERSION: u8 = 0x00;

/// Maximum command-specific payload size in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 250;

/// Minimum frame size: version + length + 2 command-code bytes + checksum.
pub const MIN_FRAME_SIZE: usize = 5;

/// 16-bit command code identifying request or response semantics.
pub type CommandCode = u16;

/// XOR-fold of a byte slice.
#[inline]
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Assemble a complete, checksummed frame (not yet SLIP-escaped).
///
/// # Errors
///
/// Returns [`GatewayError::Encoding`] if `payload` exceeds
/// [`MAX_PAYLOAD_SIZE`].
pub fn encode_frame(code: CommandCode, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(GatewayError::Encoding(format!(
            "payload size {} exceeds maximum {}",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut buf = Vec::with_capacity(MIN_FRAME_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.push((3 + payload.len()) as u8);
    buf.extend_from_slice(&code.to_be_bytes());
    buf.extend_from_slice(payload);
    let checksum = xor_checksum(&buf);
    buf.push(checksum);
    Ok(buf)
}

/// Validate an unescaped frame and extract its command code and payload.
///
/// Checks, in order, each a distinct rejection reason: minimum size,
/// protocol version, declared length against actual byte count, and the
/// XOR checksum. Payload semantics are never evaluated here.
pub fn decode_frame(raw: Bytes) -> std::result::Result<Frame, FrameError> {
    if raw.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort(raw.len()));
    }
    if raw[0] != PROTOCOL_VERSION {
        return Err(FrameError::BadVersion(raw[0]));
    }
    let declared = raw[1];
    let actual = (raw.len() - 2) as u8;
    if declared != actual {
        return Err(FrameError::LengthMismatch { declared, actual });
    }
    let expected = xor_checksum(&raw[..raw.len() - 1]);
    let got = raw[raw.len() - 1];
    if expected != got {
        return Err(FrameError::ChecksumMismatch { expected, got });
    }

    let code = u16::from_be_bytes([raw[2], raw[3]]);
    let payload = raw.slice(4..raw.len() - 1);
    Ok(Frame::new(code, payload))
}
