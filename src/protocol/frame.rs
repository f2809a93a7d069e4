//! Frame struct with typed accessors.
//!
//! Represents one validated protocol message: a 16-bit command code and
//! its command-specific payload. Uses `bytes::Bytes` for zero-copy
//! payload sharing between the deframer and the command that consumes
//! the response.

use bytes::Bytes;

/// A validated protocol frame (version, length and checksum already
/// checked and stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command code identifying request or response semantics.
    pub command_code: u16,
    /// Command-specific payload (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from command code and payload.
    pub fn new(command_code: u16, payload: Bytes) -> Self {
        Self {
            command_code,
            payload,
        }
    }

    /// Create a frame from command code and raw bytes (copies data).
    pub fn from_parts(command_code: u16, payload: &[u8]) -> Self {
        Self {
            command_code,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get the command code.
    #[inline]
    pub fn command_code(&self) -> u16 {
        self.command_code
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}
