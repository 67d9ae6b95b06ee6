//! Protocol error types.

use thiserror::Error;

/// Numeric outcome code for "nothing to do": a byte wait ran out of budget.
pub const CODE_NO_DATA: i32 = 0;
/// Numeric outcome code for a misplaced delimiter or an invalid frame shape.
pub const CODE_FRAMING_ERROR: i32 = -1;
/// Numeric outcome code for a checksum mismatch.
pub const CODE_CHECKSUM_ERROR: i32 = -2;
/// Numeric outcome code for a frame that does not fit the receive buffer.
pub const CODE_OVERSIZED: i32 = -3;

/// Errors a single decode call can end with.
///
/// None of these are fatal: the caller drops the frame and calls the decoder
/// again, which reseeks a start delimiter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A raw start delimiter appeared where a length, content or checksum
    /// byte was expected.
    #[error("unexpected start delimiter at frame offset {offset}")]
    UnexpectedDelimiter {
        /// Logical offset after the delimiter (0 and 1 are the length field).
        offset: usize,
    },

    /// The trailing checksum does not match the content.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the received content.
        expected: u8,
        /// Checksum byte found on the wire.
        actual: u8,
    },

    /// The declared content length does not fit the caller's buffer.
    #[error("frame too large: declared {declared} content bytes, buffer holds {capacity}")]
    Oversized {
        /// Content length from the length field.
        declared: usize,
        /// Usable buffer size (content plus checksum).
        capacity: usize,
    },

    /// The frame checks out but carries no frame type, or frame type 0x00.
    #[error("frame carries no valid frame type")]
    ReservedFrameType,
}

impl DecodeError {
    /// Numeric outcome code of this error.
    pub fn code(&self) -> i32 {
        match self {
            DecodeError::UnexpectedDelimiter { .. } | DecodeError::ReservedFrameType => {
                CODE_FRAMING_ERROR
            }
            DecodeError::ChecksumMismatch { .. } => CODE_CHECKSUM_ERROR,
            DecodeError::Oversized { .. } => CODE_OVERSIZED,
        }
    }
}

/// Errors raised when building or interpreting frame content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload does not fit the 16-bit length field.
    #[error("payload too large: maximum {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Maximum allowed payload length.
        max: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Frame content is too short for its frame type.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame type differs from the one being parsed.
    #[error("unexpected frame type: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedFrameType {
        /// Frame type the parser handles.
        expected: u8,
        /// Frame type found in the content.
        actual: u8,
    },

    /// An address string could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
