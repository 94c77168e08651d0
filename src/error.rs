//! Error types for peerwire.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all peerwire operations.
///
/// Each failure mode of the message path gets its own variant so callers
/// can tell a retryable timeout apart from a dead stream, and an oversized
/// payload apart from a corrupt one.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error with no more specific phase attribution.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to arm the write deadline on the underlying stream.
    #[error("set write deadline: {0}")]
    Deadline(#[source] std::io::Error),

    /// Underlying write failed while emitting a frame.
    #[error("write frame: {0}")]
    Write(#[source] std::io::Error),

    /// Underlying read failed while receiving a frame.
    #[error("read frame: {0}")]
    Read(#[source] std::io::Error),

    /// Payload (after compression) exceeds the maximum frame size.
    #[error("message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge {
        /// Size of the rejected payload in bytes.
        size: usize,
        /// The enforced maximum frame size.
        max: usize,
    },

    /// Compression of an outbound payload failed.
    #[error("compress payload: {0}")]
    Compression(std::io::Error),

    /// Decompression of an inbound payload failed (corrupt data).
    #[error("decompress payload: {0}")]
    Decompression(std::io::Error),

    /// Numeric algorithm id does not map to a known compression algorithm.
    #[error("unknown compression algorithm id: {0}")]
    UnknownAlgorithm(u8),

    /// Stream delivered a frame that violates the wire format
    /// (truncated payload, varint overflow, or mid-frame EOF).
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Peer closed the stream cleanly before a frame started.
    #[error("peer closed the stream")]
    PeerClosed,

    /// Write did not complete within the send timeout.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// No complete frame arrived within the read timeout.
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// Composite failure: the send phase of a request/response exchange
    /// failed, so the read phase was never attempted.
    #[error("failed to send message: {0}")]
    SendFailed(#[source] Box<WireError>),
}

impl WireError {
    /// Whether this error is a deadline expiry (retryable with a fresh
    /// deadline, as opposed to a dead stream).
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, WireError::ReadTimeout(_) | WireError::WriteTimeout(_))
    }
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
