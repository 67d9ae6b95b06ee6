//! XBee API 2 Frame Codec
//!
//! This crate encodes and decodes the escaped ("API 2") frame format that
//! XBee radio modules speak over their serial interface.
//!
//! # Protocol Overview
//!
//! Every frame starts with the delimiter `0x7E`, followed by a big-endian
//! length, the frame content and a one-byte checksum. The bytes `0x7E`, `0x7D`,
//! `0x11` and `0x13` never appear literally after the delimiter: each one is
//! sent as `0x7D` followed by the byte XORed with `0x20`.
//!
//! - **Outbound**: [`TransmitRequest`] builds 0x10 transmit request frames.
//! - **Inbound**: [`FrameDecoder`] reads frames byte by byte from a
//!   [`ByteTimeoutSource`], resynchronizing on the delimiter and checking the
//!   checksum. [`ReceivePacket`] interprets 0x90 receive indications.
//!
//! # Example
//!
//! ```rust
//! use xbee_frame::{Address16, Address64, FrameDecoder, SliceSource, TransmitRequest};
//!
//! let request = TransmitRequest::new(
//!     0x01,
//!     Address64::new(0x0013_A200_41F2_17CC),
//!     Address16::UNKNOWN,
//!     b"hello",
//! )?;
//! let wire = request.encode();
//!
//! let mut source = SliceSource::new(&wire);
//! let mut buf = [0u8; 64];
//! let frame = FrameDecoder::default()
//!     .decode(&mut source, &mut buf)?
//!     .expect("frame should be complete");
//! assert_eq!(frame.frame_type, 0x10);
//! assert_eq!(&frame.content[14..], b"hello");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod constants;
mod decoder;
mod error;
mod escape;
mod frame;
mod source;
mod types;

pub use constants::*;
pub use decoder::*;
pub use error::*;
pub use escape::*;
pub use frame::*;
pub use source::*;
pub use types::*;
