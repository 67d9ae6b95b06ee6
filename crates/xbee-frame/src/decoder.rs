//! Frame decoding from a byte source.
//!
//! Each call to [`FrameDecoder::decode`] runs one pass of a small state
//! machine and keeps nothing between calls:
//!
//! 1. Drop bytes until a start delimiter.
//! 2. Read the two length bytes.
//! 3. Read `length` content bytes and the checksum into the caller's buffer.
//! 4. Check the checksum.
//!
//! Escapes are resolved as bytes arrive, since the logical length is not
//! known until the length field itself has been unescaped. A raw delimiter
//! anywhere after step 1 aborts the call. The delimiter is consumed: the next
//! call either starts over from step 1, or treats it as a new frame start via
//! [`FrameDecoder::decode_after_delimiter`].

use std::time::Duration;

use crate::constants::*;
use crate::error::{DecodeError, CODE_NO_DATA};
use crate::escape::{checksum, unescape_byte};
use crate::source::{ByteTimeoutSource, WaitBudget};
use crate::types::ParsedFrame;

/// Result of one decode call. `Ok(None)` means no data arrived in time.
pub type DecodeResult<'a> = Result<Option<ParsedFrame<'a>>, DecodeError>;

/// Numeric form of a decode result: the content length on success,
/// [`CODE_NO_DATA`] when nothing arrived, or the error's negative code.
pub fn outcome_code(result: &DecodeResult<'_>) -> i32 {
    match result {
        Ok(Some(frame)) => i32::try_from(frame.len()).unwrap_or(i32::MAX),
        Ok(None) => CODE_NO_DATA,
        Err(err) => err.code(),
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    /// Wait budget for every raw byte.
    pub budget: WaitBudget,
    /// Most non-delimiter bytes dropped per call while looking for a frame
    /// start. `None` drops without limit until a byte wait times out.
    pub max_discard: Option<usize>,
}

/// Decoder for escaped API frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    config: DecoderConfig,
}

impl FrameDecoder {
    /// Create a decoder.
    pub fn new(config: DecoderConfig) -> Self {
        FrameDecoder { config }
    }

    /// Create a decoder with the given byte wait budget and no discard limit.
    pub fn with_budget(budget: WaitBudget) -> Self {
        Self::new(DecoderConfig {
            budget,
            max_discard: None,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode the next frame from `source` into `buf`.
    ///
    /// `buf` must hold the content plus the checksum byte. On success the
    /// returned frame borrows its content from `buf`.
    pub fn decode<'b, S>(&self, source: &mut S, buf: &'b mut [u8]) -> DecodeResult<'b>
    where
        S: ByteTimeoutSource + ?Sized,
    {
        if !self.seek_delimiter(source) {
            return Ok(None);
        }
        self.decode_after_delimiter(source, buf)
    }

    /// Decode a frame whose start delimiter has already been consumed.
    ///
    /// After [`DecodeError::UnexpectedDelimiter`] the delimiter that caused
    /// the error may be the start of the next frame; callers can pick up
    /// from there with this method instead of [`decode`](Self::decode).
    pub fn decode_after_delimiter<'b, S>(
        &self,
        source: &mut S,
        buf: &'b mut [u8],
    ) -> DecodeResult<'b>
    where
        S: ByteTimeoutSource + ?Sized,
    {
        let mut length = [0u8; LENGTH_FIELD_SIZE];
        for (offset, slot) in length.iter_mut().enumerate() {
            match self.read_unescaped(source, offset)? {
                Some(byte) => *slot = byte,
                None => return Ok(None),
            }
        }
        let declared = u16::from_be_bytes(length) as usize;

        let needed = declared + CHECKSUM_SIZE;
        if needed > buf.len() {
            log::debug!(
                "dropping frame: {} content bytes exceed buffer of {}",
                declared,
                buf.len()
            );
            return Err(DecodeError::Oversized {
                declared,
                capacity: buf.len(),
            });
        }

        for (i, slot) in buf[..needed].iter_mut().enumerate() {
            match self.read_unescaped(source, LENGTH_FIELD_SIZE + i)? {
                Some(byte) => *slot = byte,
                None => return Ok(None),
            }
        }

        let expected = checksum(&buf[..declared]);
        let actual = buf[declared];
        if expected != actual {
            log::debug!(
                "dropping frame: checksum 0x{:02X}, computed 0x{:02X}",
                actual,
                expected
            );
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        if declared == 0 || buf[0] == FRAME_TYPE_NONE {
            return Err(DecodeError::ReservedFrameType);
        }

        let buf: &'b [u8] = buf;
        Ok(Some(ParsedFrame {
            frame_type: buf[0],
            content: &buf[..declared],
        }))
    }

    /// Upper bound on how long one call may block for a frame with
    /// `content_len` content bytes.
    ///
    /// Counts the seek phase and two raw waits for every logical byte, in
    /// case each one is escaped. Returns `None` when the discard count is
    /// unbounded, since line noise can then keep the seek phase going.
    pub fn worst_case_wait(&self, content_len: usize) -> Option<Duration> {
        let seek_waits = self.config.max_discard?.checked_add(1)?;
        let body_waits = content_len
            .checked_add(LENGTH_FIELD_SIZE + CHECKSUM_SIZE)?
            .checked_mul(2)?;
        let waits = u32::try_from(seek_waits.checked_add(body_waits)?).ok()?;
        self.config.budget.timeout().checked_mul(waits)
    }

    /// Drop bytes until a start delimiter. Returns false on timeout or when
    /// the discard limit is reached.
    fn seek_delimiter<S>(&self, source: &mut S) -> bool
    where
        S: ByteTimeoutSource + ?Sized,
    {
        let mut discarded = 0usize;
        loop {
            if matches!(self.config.max_discard, Some(max) if discarded >= max) {
                log::trace!("no start delimiter within {} bytes", discarded);
                return false;
            }
            match source.try_read_byte(self.config.budget) {
                Some(START_DELIMITER) => {
                    if discarded > 0 {
                        log::trace!("skipped {} bytes before start delimiter", discarded);
                    }
                    return true;
                }
                Some(_) => discarded += 1,
                None => {
                    if discarded > 0 {
                        log::trace!("skipped {} bytes, then timed out", discarded);
                    }
                    return false;
                }
            }
        }
    }

    /// Read one logical byte at `offset` (counted from the length field).
    ///
    /// `Ok(None)` on timeout, an error if a raw delimiter shows up.
    fn read_unescaped<S>(&self, source: &mut S, offset: usize) -> Result<Option<u8>, DecodeError>
    where
        S: ByteTimeoutSource + ?Sized,
    {
        let budget = self.config.budget;
        let Some(raw) = source.try_read_byte(budget) else {
            return Ok(None);
        };
        match raw {
            START_DELIMITER => Err(unexpected_delimiter(offset)),
            ESCAPE_BYTE => match source.try_read_byte(budget) {
                // A delimiter is never the target of an escape
                Some(START_DELIMITER) => Err(unexpected_delimiter(offset)),
                Some(escaped) => Ok(Some(unescape_byte(escaped))),
                None => Ok(None),
            },
            byte => Ok(Some(byte)),
        }
    }
}

fn unexpected_delimiter(offset: usize) -> DecodeError {
    log::debug!("dropping frame: start delimiter at offset {}", offset);
    DecodeError::UnexpectedDelimiter { offset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ScriptedSource, SliceSource};

    fn decoder() -> FrameDecoder {
        FrameDecoder::with_budget(WaitBudget::new(Duration::ZERO, 10))
    }

    #[test]
    fn test_decode_minimal_frame() {
        // Type 0x8A (modem status), content 0x8A 0x06, checksum 0xFF - 0x90
        let wire = [0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];

        let frame = decoder().decode(&mut source, &mut buf).unwrap().unwrap();
        assert_eq!(frame.frame_type, 0x8A);
        assert_eq!(frame.content, &[0x8A, 0x06]);
        assert_eq!(frame.len(), 2);
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_skips_garbage_before_delimiter() {
        let wire = [0x01, 0x02, 0x03, 0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];

        let frame = decoder().decode(&mut source, &mut buf).unwrap().unwrap();
        assert_eq!(frame.frame_type, 0x8A);
    }

    #[test]
    fn test_unescapes_content_and_checksum() {
        // Content 0x8A 0x11 -> sum 0x9B, checksum 0x64; 0x11 is escaped
        let wire = [0x7E, 0x00, 0x02, 0x8A, 0x7D, 0x31, 0x64];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];

        let frame = decoder().decode(&mut source, &mut buf).unwrap().unwrap();
        assert_eq!(frame.content, &[0x8A, 0x11]);
    }

    #[test]
    fn test_unescapes_length() {
        // Length 0x0013 is escaped as 7D 33
        let mut content = vec![0x8A];
        content.extend(std::iter::repeat(0x01).take(0x12));
        let mut wire = vec![0x7E, 0x00, 0x7D, 0x33];
        wire.extend_from_slice(&content);
        wire.push(checksum(&content));

        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 64];
        let frame = decoder().decode(&mut source, &mut buf).unwrap().unwrap();
        assert_eq!(frame.len(), 0x13);
    }

    #[test]
    fn test_no_data_while_seeking() {
        let mut source = ScriptedSource::new();
        let mut buf = [0u8; 16];
        assert_eq!(decoder().decode(&mut source, &mut buf), Ok(None));
        assert_eq!(source.polls(), 10);
    }

    #[test]
    fn test_timeout_mid_frame() {
        let mut source = ScriptedSource::new()
            .bytes(&[0x7E, 0x00, 0x02, 0x8A])
            .timeout()
            .bytes(&[0x06, 0x6F]);
        let mut buf = [0u8; 16];
        assert_eq!(decoder().decode(&mut source, &mut buf), Ok(None));
        // The rest of the frame is still in the source, with no delimiter
        assert_eq!(source.remaining_bytes(), vec![0x06, 0x6F]);
    }

    #[test]
    fn test_timeout_after_escape() {
        let mut source = ScriptedSource::new().bytes(&[0x7E, 0x00, 0x7D]).timeout();
        let mut buf = [0u8; 16];
        assert_eq!(decoder().decode(&mut source, &mut buf), Ok(None));
    }

    #[test]
    fn test_delimiter_in_length() {
        let wire = [0x7E, 0x00, 0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];

        assert_eq!(
            decoder().decode(&mut source, &mut buf),
            Err(DecodeError::UnexpectedDelimiter { offset: 1 })
        );
        // The stray delimiter was consumed; the rest is a valid frame body
        assert_eq!(source.position(), 3);
    }

    #[test]
    fn test_escaped_delimiter_is_framing_error() {
        let wire = [0x7E, 0x00, 0x02, 0x7D, 0x7E];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];
        assert_eq!(
            decoder().decode(&mut source, &mut buf),
            Err(DecodeError::UnexpectedDelimiter { offset: 2 })
        );
    }

    #[test]
    fn test_checksum_mismatch() {
        let wire = [0x7E, 0x00, 0x02, 0x8A, 0x06, 0x70];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];
        assert_eq!(
            decoder().decode(&mut source, &mut buf),
            Err(DecodeError::ChecksumMismatch {
                expected: 0x6F,
                actual: 0x70
            })
        );
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_oversized_frame() {
        let wire = [0x7E, 0x00, 0x20, 0x8A];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 8];
        assert_eq!(
            decoder().decode(&mut source, &mut buf),
            Err(DecodeError::Oversized {
                declared: 0x20,
                capacity: 8
            })
        );
        // Content is left unread
        assert_eq!(source.remaining(), &[0x8A]);
    }

    #[test]
    fn test_buffer_exactly_fits() {
        let wire = [0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 3];
        assert!(decoder().decode(&mut source, &mut buf).unwrap().is_some());
    }

    #[test]
    fn test_zero_length_frame_rejected() {
        let wire = [0x7E, 0x00, 0x00, 0xFF];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 4];
        assert_eq!(
            decoder().decode(&mut source, &mut buf),
            Err(DecodeError::ReservedFrameType)
        );
    }

    #[test]
    fn test_frame_type_zero_rejected() {
        let wire = [0x7E, 0x00, 0x01, 0x00, 0xFF];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 4];
        assert_eq!(
            decoder().decode(&mut source, &mut buf),
            Err(DecodeError::ReservedFrameType)
        );
    }

    #[test]
    fn test_max_discard_limits_seek() {
        let decoder = FrameDecoder::new(DecoderConfig {
            budget: WaitBudget::new(Duration::ZERO, 10),
            max_discard: Some(3),
        });
        let wire = [0x01, 0x02, 0x03, 0x04, 0x7E, 0x00, 0x02, 0x8A, 0x06, 0x6F];
        let mut source = SliceSource::new(&wire);
        let mut buf = [0u8; 16];

        assert_eq!(decoder.decode(&mut source, &mut buf), Ok(None));
        assert_eq!(source.position(), 3);

        // One more garbage byte, then the frame
        let frame = decoder.decode(&mut source, &mut buf).unwrap().unwrap();
        assert_eq!(frame.frame_type, 0x8A);
    }

    #[test]
    fn test_worst_case_wait() {
        let unbounded = FrameDecoder::default();
        assert_eq!(unbounded.worst_case_wait(16), None);

        let bounded = FrameDecoder::new(DecoderConfig {
            budget: WaitBudget::new(Duration::from_millis(1), 2),
            max_discard: Some(9),
        });
        // (9 + 1) seek waits + 2 * (2 + 16 + 1) body waits, 2 ms each
        assert_eq!(
            bounded.worst_case_wait(16),
            Some(Duration::from_millis(2 * (10 + 38)))
        );
    }

    #[test]
    fn test_outcome_code() {
        let content = [0x88, 0x01];
        let frame = ParsedFrame {
            frame_type: 0x88,
            content: &content,
        };
        assert_eq!(outcome_code(&Ok(Some(frame))), 2);
        assert_eq!(outcome_code(&Ok(None)), CODE_NO_DATA);
        assert_eq!(
            outcome_code(&Err(DecodeError::UnexpectedDelimiter { offset: 1 })),
            -1
        );
        assert_eq!(
            outcome_code(&Err(DecodeError::ChecksumMismatch {
                expected: 0x10,
                actual: 0x11,
            })),
            -2
        );
    }

    #[test]
    fn test_worst_case_wait_overflow_is_none() {
        let huge_discard = FrameDecoder::new(DecoderConfig {
            budget: WaitBudget::default(),
            max_discard: Some(usize::MAX),
        });
        assert_eq!(huge_discard.worst_case_wait(16), None);

        let bounded = FrameDecoder::new(DecoderConfig {
            budget: WaitBudget::default(),
            max_discard: Some(16),
        });
        assert_eq!(bounded.worst_case_wait(usize::MAX), None);
        assert_eq!(bounded.worst_case_wait(usize::MAX / 2), None);
        assert!(bounded.worst_case_wait(16).is_some());
    }
}
