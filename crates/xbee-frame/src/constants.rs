//! Protocol constants
//!
//! Byte values and fixed sizes of the XBee API 2 (escaped) frame format.

// ============================================================================
// Framing
// ============================================================================

/// Start delimiter. Marks the beginning of every frame and is never escaped.
pub const START_DELIMITER: u8 = 0x7E;
/// Escape byte. The following raw byte must be XORed with [`ESCAPE_MASK`].
pub const ESCAPE_BYTE: u8 = 0x7D;
/// Value XORed into an escaped byte.
pub const ESCAPE_MASK: u8 = 0x20;
/// Software flow control XON.
pub const XON: u8 = 0x11;
/// Software flow control XOFF.
pub const XOFF: u8 = 0x13;

/// Byte values that must be escaped between the delimiter and the checksum.
pub const RESERVED_BYTES: [u8; 4] = [START_DELIMITER, ESCAPE_BYTE, XON, XOFF];

/// Size of the big-endian length field.
pub const LENGTH_FIELD_SIZE: usize = 2;
/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 1;

/// Value the checksum is subtracted from.
pub const CHECKSUM_BASE: u8 = 0xFF;

// ============================================================================
// Frame Types
// ============================================================================

/// Not a frame type. Reserved to mean "no valid frame".
pub const FRAME_TYPE_NONE: u8 = 0x00;
/// 64-bit transmit request (host → module).
pub const FRAME_TYPE_TRANSMIT_REQUEST: u8 = 0x10;
/// Receive packet indication (module → host).
pub const FRAME_TYPE_RECEIVE_PACKET: u8 = 0x90;

// ============================================================================
// Transmit Request Layout
// ============================================================================

/// Content bytes of a transmit request before the payload:
/// frame type, frame id, 64-bit address, 16-bit address, radius, options.
pub const TRANSMIT_REQUEST_HEADER_SIZE: usize = 14;

/// Bytes a transmit request adds around its payload on the wire before
/// escaping: delimiter, length field, header, checksum.
pub const TRANSMIT_REQUEST_OVERHEAD: usize =
    1 + LENGTH_FIELD_SIZE + TRANSMIT_REQUEST_HEADER_SIZE + CHECKSUM_SIZE;

/// Largest payload whose content length still fits the 16-bit length field.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - TRANSMIT_REQUEST_HEADER_SIZE;

/// Frame id that asks the module not to send a transmit status.
pub const FRAME_ID_NO_ACK: u8 = 0x00;

/// Broadcast radius used for every transmit request (module default hops).
pub const DEFAULT_BROADCAST_RADIUS: u8 = 0x00;
/// Transmit options used for every transmit request.
pub const DEFAULT_TRANSMIT_OPTIONS: u8 = 0x00;

// ============================================================================
// Receive Packet Layout
// ============================================================================

/// Offset of the application data within receive packet content:
/// frame type (1), source 64-bit address (8), source 16-bit address (2),
/// receive options (1).
pub const RECEIVE_PACKET_DATA_OFFSET: usize = 12;

// ============================================================================
// Addresses
// ============================================================================

/// Size of a 64-bit address.
pub const ADDRESS64_SIZE: usize = 8;
/// Size of a 16-bit network address.
pub const ADDRESS16_SIZE: usize = 2;

/// 64-bit broadcast address.
pub const BROADCAST_ADDRESS64: u64 = 0x0000_0000_0000_FFFF;
/// 16-bit address used when the network address is unknown.
pub const UNKNOWN_ADDRESS16: u16 = 0xFFFE;
