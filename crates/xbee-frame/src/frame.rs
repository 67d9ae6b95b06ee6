//! Transmit request frame encoding.
//!
//! An API 2 frame on the wire:
//!
//! ```text
//! +------+-----+-----+------+----+--------+--------+--------+------+---------+-----+
//! | 0x7E | len | len | 0x10 | id | addr64 | addr16 | radius | opts | payload | sum |
//! |      | hi  | lo  |      |    | 8 B    | 2 B    |        |      |         |     |
//! +------+-----+-----+------+----+--------+--------+--------+------+---------+-----+
//! ```
//!
//! The length counts the frame type through the last payload byte. The
//! checksum is `0xFF` minus the low byte of the sum of those same bytes.
//! Everything after the delimiter is escaped; length and checksum are
//! computed before escaping.

use bytes::BufMut;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::escape::{checksum, escape_count, escape_into};
use crate::types::{Address16, Address64};

/// A 0x10 transmit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitRequest<'a> {
    /// Frame id. [`FRAME_ID_NO_ACK`] asks for no transmit status.
    pub frame_id: u8,
    /// Destination 64-bit address.
    pub dest64: Address64,
    /// Destination 16-bit network address.
    pub dest16: Address16,
    payload: &'a [u8],
}

impl<'a> TransmitRequest<'a> {
    /// Create a transmit request.
    ///
    /// Fails if the payload does not fit the 16-bit length field.
    pub fn new(
        frame_id: u8,
        dest64: Address64,
        dest16: Address16,
        payload: &'a [u8],
    ) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: payload.len(),
            });
        }
        Ok(TransmitRequest {
            frame_id,
            dest64,
            dest16,
            payload,
        })
    }

    /// Create a broadcast request with no acknowledgment.
    pub fn broadcast(payload: &'a [u8]) -> Result<Self, ProtocolError> {
        Self::new(
            FRAME_ID_NO_ACK,
            Address64::BROADCAST,
            Address16::UNKNOWN,
            payload,
        )
    }

    /// The payload carried by this request.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Value of the length field: frame type through last payload byte.
    pub fn content_len(&self) -> u16 {
        // Bounded by MAX_PAYLOAD_SIZE in `new`
        (TRANSMIT_REQUEST_HEADER_SIZE + self.payload.len()) as u16
    }

    /// Unescaped frame after the delimiter: length field, content, checksum.
    pub fn unescaped(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            LENGTH_FIELD_SIZE + TRANSMIT_REQUEST_HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE,
        );

        // 1. Length (big-endian)
        buf.put_u16(self.content_len());

        // 2. Frame type and id
        buf.put_u8(FRAME_TYPE_TRANSMIT_REQUEST);
        buf.put_u8(self.frame_id);

        // 3. Addresses (big-endian)
        buf.put_slice(&self.dest64.to_bytes());
        buf.put_slice(&self.dest16.to_bytes());

        // 4. Broadcast radius and options
        buf.put_u8(DEFAULT_BROADCAST_RADIUS);
        buf.put_u8(DEFAULT_TRANSMIT_OPTIONS);

        // 5. Payload
        buf.put_slice(self.payload);

        // 6. Checksum over frame type..payload
        let sum = checksum(&buf[LENGTH_FIELD_SIZE..]);
        buf.put_u8(sum);

        buf
    }

    /// Exact number of bytes [`encode`](Self::encode) produces.
    pub fn encoded_len(&self) -> usize {
        1 + self.payload.len()
            + LENGTH_FIELD_SIZE
            + TRANSMIT_REQUEST_HEADER_SIZE
            + CHECKSUM_SIZE
            + escape_count(&self.unescaped())
    }

    /// Write the escaped frame into `out`. Returns the number of bytes written.
    pub fn encode_into<B: BufMut>(&self, out: &mut B) -> usize {
        let unescaped = self.unescaped();
        out.put_u8(START_DELIMITER);
        let escapes = escape_into(&unescaped, out);
        TRANSMIT_REQUEST_OVERHEAD + self.payload.len() + escapes
    }

    /// Encode the escaped frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(max_encoded_len(self.payload.len()));
        self.encode_into(&mut buf);
        buf
    }
}

/// Worst-case wire size of a transmit request with `payload_len` bytes,
/// when every byte after the delimiter needs escaping.
pub fn max_encoded_len(payload_len: usize) -> usize {
    1 + 2 * (TRANSMIT_REQUEST_OVERHEAD - 1 + payload_len)
}
