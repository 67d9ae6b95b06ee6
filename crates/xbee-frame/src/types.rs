//! Common types used in the protocol.

use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::ProtocolError;

/// A 64-bit device address, sent most-significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address64(pub u64);

impl Address64 {
    /// The 64-bit broadcast address.
    pub const BROADCAST: Address64 = Address64(BROADCAST_ADDRESS64);

    /// Create a new address.
    pub fn new(addr: u64) -> Self {
        Address64(addr)
    }

    /// Create from a slice. Returns None if the slice is shorter than 8 bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; ADDRESS64_SIZE] = slice.get(..ADDRESS64_SIZE)?.try_into().ok()?;
        Some(Address64(u64::from_be_bytes(bytes)))
    }

    /// Wire representation.
    pub fn to_bytes(self) -> [u8; ADDRESS64_SIZE] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Address64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for Address64 {
    type Err = ProtocolError;

    /// Parse 16 hex digits, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s, ADDRESS64_SIZE * 2).map(Address64)
    }
}

/// A 16-bit network address, sent most-significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address16(pub u16);

impl Address16 {
    /// Address used when the network address of the destination is unknown.
    pub const UNKNOWN: Address16 = Address16(UNKNOWN_ADDRESS16);

    /// Create a new address.
    pub fn new(addr: u16) -> Self {
        Address16(addr)
    }

    /// Create from a slice. Returns None if the slice is shorter than 2 bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; ADDRESS16_SIZE] = slice.get(..ADDRESS16_SIZE)?.try_into().ok()?;
        Some(Address16(u16::from_be_bytes(bytes)))
    }

    /// Wire representation.
    pub fn to_bytes(self) -> [u8; ADDRESS16_SIZE] {
        self.0.to_be_bytes()
    }
}

impl Default for Address16 {
    fn default() -> Self {
        Address16::UNKNOWN
    }
}

impl fmt::Display for Address16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl FromStr for Address16 {
    type Err = ProtocolError;

    /// Parse 4 hex digits, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s, ADDRESS16_SIZE * 2).map(|v| Address16(v as u16))
    }
}

fn parse_hex(s: &str, max_digits: usize) -> Result<u64, ProtocolError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty()
        || digits.len() > max_digits
        || !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(ProtocolError::InvalidAddress(s.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| ProtocolError::InvalidAddress(s.to_string()))
}

/// A frame released by the decoder.
///
/// The content is borrowed from the caller's receive buffer and covers the
/// frame type through the last byte before the checksum. Addressing fields
/// are not stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFrame<'a> {
    /// First content byte. Never [`FRAME_TYPE_NONE`].
    pub frame_type: u8,
    /// Unescaped content, frame type included.
    pub content: &'a [u8],
}

impl<'a> ParsedFrame<'a> {
    /// Content length as declared by the length field.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Always false for frames released by the decoder.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns true if this is a receive packet indication.
    pub fn is_receive_packet(&self) -> bool {
        self.frame_type == FRAME_TYPE_RECEIVE_PACKET
    }
}

/// Receive packet indication (frame type 0x90).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivePacket<'a> {
    /// Sender's 64-bit address.
    pub source64: Address64,
    /// Sender's 16-bit network address.
    pub source16: Address16,
    /// Receive options bitfield.
    pub options: u8,
    /// Application data.
    pub data: &'a [u8],
}

impl<'a> ReceivePacket<'a> {
    /// Receive option bit: packet was acknowledged.
    pub const OPTION_ACKNOWLEDGED: u8 = 0x01;
    /// Receive option bit: packet was a broadcast.
    pub const OPTION_BROADCAST: u8 = 0x02;

    /// Interpret decoded frame content as a receive packet.
    pub fn parse(frame: &ParsedFrame<'a>) -> Result<Self, ProtocolError> {
        if frame.frame_type != FRAME_TYPE_RECEIVE_PACKET {
            return Err(ProtocolError::UnexpectedFrameType {
                expected: FRAME_TYPE_RECEIVE_PACKET,
                actual: frame.frame_type,
            });
        }
        let content = frame.content;
        if content.len() < RECEIVE_PACKET_DATA_OFFSET {
            return Err(ProtocolError::FrameTooShort {
                expected: RECEIVE_PACKET_DATA_OFFSET,
                actual: content.len(),
            });
        }

        let source64 = Address64::from_slice(&content[1..]).ok_or(ProtocolError::FrameTooShort {
            expected: RECEIVE_PACKET_DATA_OFFSET,
            actual: content.len(),
        })?;
        let source16 = Address16::from_slice(&content[1 + ADDRESS64_SIZE..]).ok_or(
            ProtocolError::FrameTooShort {
                expected: RECEIVE_PACKET_DATA_OFFSET,
                actual: content.len(),
            },
        )?;

        Ok(ReceivePacket {
            source64,
            source16,
            options: content[RECEIVE_PACKET_DATA_OFFSET - 1],
            data: &content[RECEIVE_PACKET_DATA_OFFSET..],
        })
    }

    /// Returns true if the sender requested an acknowledgment.
    pub fn is_acknowledged(&self) -> bool {
        self.options & Self::OPTION_ACKNOWLEDGED != 0
    }

    /// Returns true if the packet was broadcast.
    pub fn is_broadcast(&self) -> bool {
        self.options & Self::OPTION_BROADCAST != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address64_bytes() {
        let addr = Address64::new(0x0013_A200_41F2_17CC);
        assert_eq!(
            addr.to_bytes(),
            [0x00, 0x13, 0xA2, 0x00, 0x41, 0xF2, 0x17, 0xCC]
        );
        assert_eq!(Address64::from_slice(&addr.to_bytes()), Some(addr));
        assert_eq!(Address64::from_slice(&[0u8; 7]), None);
    }

    #[test]
    fn test_address_parse() {
        let addr: Address64 = "0013A20041F217CC".parse().unwrap();
        assert_eq!(addr, Address64(0x0013_A200_41F2_17CC));
        assert_eq!(addr.to_string(), "0013A20041F217CC");

        let addr: Address64 = "0xffff".parse().unwrap();
        assert_eq!(addr, Address64::BROADCAST);

        let addr: Address16 = "FFFE".parse().unwrap();
        assert_eq!(addr, Address16::UNKNOWN);

        assert!("0013A20041F217CC00".parse::<Address64>().is_err());
        assert!("12345".parse::<Address16>().is_err());
        assert!("zz".parse::<Address16>().is_err());
        assert!("".parse::<Address16>().is_err());
    }

    #[test]
    fn test_address_parse_rejects_malformed_prefix_and_sign() {
        assert!("0x0x12".parse::<Address16>().is_err());
        assert!("0x".parse::<Address16>().is_err());
        assert!("+FFF".parse::<Address16>().is_err());
        assert!("+0013A20041F217C".parse::<Address64>().is_err());
        assert!("-1".parse::<Address64>().is_err());
        assert_eq!("0X12".parse::<Address16>().unwrap(), Address16(0x12));
        assert_eq!(" 00ff ".parse::<Address16>().unwrap(), Address16(0xFF));
    }

    #[test]
    fn test_receive_packet_parse() {
        let mut content = vec![FRAME_TYPE_RECEIVE_PACKET];
        content.extend_from_slice(&0x0013_A200_41F2_17CCu64.to_be_bytes());
        content.extend_from_slice(&[0x12, 0x34]);
        content.push(0x01);
        content.extend_from_slice(b"hi");

        let frame = ParsedFrame {
            frame_type: FRAME_TYPE_RECEIVE_PACKET,
            content: &content,
        };
        let packet = ReceivePacket::parse(&frame).unwrap();
        assert_eq!(packet.source64, Address64(0x0013_A200_41F2_17CC));
        assert_eq!(packet.source16, Address16(0x1234));
        assert!(packet.is_acknowledged());
        assert!(!packet.is_broadcast());
        assert_eq!(packet.data, b"hi");
    }

    #[test]
    fn test_receive_packet_rejects_other_frames() {
        let content = [FRAME_TYPE_TRANSMIT_REQUEST, 0x00];
        let frame = ParsedFrame {
            frame_type: FRAME_TYPE_TRANSMIT_REQUEST,
            content: &content,
        };
        assert!(matches!(
            ReceivePacket::parse(&frame),
            Err(ProtocolError::UnexpectedFrameType { .. })
        ));

        let content = [FRAME_TYPE_RECEIVE_PACKET, 0x00, 0x13];
        let frame = ParsedFrame {
            frame_type: FRAME_TYPE_RECEIVE_PACKET,
            content: &content,
        };
        assert_eq!(
            ReceivePacket::parse(&frame),
            Err(ProtocolError::FrameTooShort {
                expected: RECEIVE_PACKET_DATA_OFFSET,
                actual: 3
            })
        );
    }
}
