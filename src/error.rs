//! Error types for klf200-client.

use thiserror::Error;

/// Reason a received frame failed structural validation.
///
/// These never reach a command: the frame buffer drops the bytes and
/// logs the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer than the 5 bytes a minimal frame needs.
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    /// Protocol-version byte differs from the single supported value.
    #[error("unsupported protocol version: {0:#04x}")]
    BadVersion(u8),

    /// Declared length byte disagrees with the actual byte count.
    #[error("length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: u8, actual: u8 },

    /// XOR checksum over the frame does not match the final byte.
    #[error("checksum mismatch: expected {expected:#04x}, got {got:#04x}")]
    ChecksumMismatch { expected: u8, got: u8 },
}

/// Main error type for all gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// I/O error on the gateway connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally invalid inbound frame (dropped at the transport boundary).
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// Outbound frame could not be assembled (e.g. payload over 250 bytes).
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A structurally valid response carried a command code the active
    /// command's structure does not accept. Indicates a registry bug.
    #[error("protocol mismatch: unexpected response code {code:#06x}")]
    ProtocolMismatch { code: u16 },

    /// The gateway explicitly rejected an otherwise well-formed request.
    #[error("request rejected by gateway: {0}")]
    Rejected(String),

    /// No terminal frame arrived within the allotted window.
    #[error("command timed out")]
    Timeout,

    /// Caller-supplied parameters failed a command's pre-submission check.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Connection closed while a command was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// The pending command queue is at capacity.
    #[error("command queue full")]
    QueueFull,

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;
