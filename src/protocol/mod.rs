//! Protocol module - wire format, SLIP framing, and frame types.
//!
//! This module implements the gateway's binary protocol:
//! - checksummed frame encoding/decoding
//! - SLIP (RFC 1055) byte stuffing for the wire
//! - frame buffer for accumulating partial reads

mod frame;
mod frame_buffer;
pub mod slip;
mod wire_format;

pub use frame::Frame;
pub use frame_buffer::{FrameBuffer, MAX_FRAME_SIZE};
pub use wire_format::{
    decode_frame, encode_frame, xor_checksum, CommandCode, MAX_PAYLOAD_SIZE, MIN_FRAME_SIZE,
    PROTOCOL_VERSION,
};
