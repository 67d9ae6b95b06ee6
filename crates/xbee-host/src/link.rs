//! Frame link over a transport.
//!
//! [`Link`] owns the transport, the decoder and the receive buffer. Each
//! [`Link::poll`] runs one decode pass and sorts the outcome; decode faults
//! are logged and counted here and never reach the caller as errors.

use tracing::{debug, trace, warn};
use xbee_frame::{
    outcome_code, DecodeError, FrameDecoder, ParsedFrame, ReceivePacket, TransmitRequest,
};

use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use crate::telemetry::metric_defs;
use crate::transport::Transport;

/// A frame received from the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Receive packet indication.
    Receive(ReceivePacket<'a>),
    /// Any other frame, content passed through untouched.
    Other {
        /// Frame type byte.
        frame_type: u8,
        /// Unescaped content, frame type included.
        content: &'a [u8],
    },
}

impl<'a> From<ParsedFrame<'a>> for Inbound<'a> {
    fn from(frame: ParsedFrame<'a>) -> Self {
        Inbound::Other {
            frame_type: frame.frame_type,
            content: frame.content,
        }
    }
}

/// Running totals for one link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames written.
    pub frames_sent: u64,
    /// Encoded bytes written.
    pub bytes_sent: u64,
    /// Frames that passed the checksum.
    pub frames_received: u64,
    /// Polls that ended without a frame.
    pub no_data: u64,
    /// Misplaced delimiters and reserved frame types.
    pub framing_errors: u64,
    /// Checksum mismatches.
    pub checksum_errors: u64,
    /// Frames too large for the receive buffer.
    pub oversized: u64,
    /// Receive indications too short to parse.
    pub malformed: u64,
}

impl LinkStats {
    /// Frames dropped for any decode fault.
    pub fn dropped(&self) -> u64 {
        self.framing_errors + self.checksum_errors + self.oversized
    }
}

/// Sends and receives API frames over a transport.
#[derive(Debug)]
pub struct Link<T> {
    transport: T,
    decoder: FrameDecoder,
    rx_buf: Vec<u8>,
    resume_on_delimiter: bool,
    resume: bool,
    stats: LinkStats,
}

impl<T: Transport> Link<T> {
    /// Create a link with a `receive_buffer`-byte buffer (content plus
    /// checksum).
    pub fn new(transport: T, decoder: FrameDecoder, receive_buffer: usize) -> Self {
        Link {
            transport,
            decoder,
            rx_buf: vec![0u8; receive_buffer],
            resume_on_delimiter: true,
            resume: false,
            stats: LinkStats::default(),
        }
    }

    /// Create a link from host config.
    pub fn from_config(transport: T, config: &HostConfig) -> Self {
        let mut link = Self::new(
            transport,
            FrameDecoder::new(config.decoder_config()),
            config.receive_buffer,
        );
        link.set_resume_on_delimiter(config.resume_on_delimiter);
        link
    }

    /// Treat a misplaced delimiter as the start of the next frame. When off,
    /// the next poll reseeks instead.
    pub fn set_resume_on_delimiter(&mut self, enabled: bool) {
        self.resume_on_delimiter = enabled;
        if !enabled {
            self.resume = false;
        }
    }

    /// Encode and write a transmit request. Returns the wire length.
    pub fn send(&mut self, request: &TransmitRequest<'_>) -> HostResult<usize> {
        let encoded = request.encode();
        self.send_encoded(&encoded)?;
        Ok(encoded.len())
    }

    /// Write an already encoded frame.
    pub fn send_encoded(&mut self, frame: &[u8]) -> HostResult<()> {
        self.transport.send(frame).map_err(HostError::Transport)?;

        self.stats.frames_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        metrics::counter!(metric_defs::FRAMES_SENT.name).increment(1);
        metrics::counter!(metric_defs::BYTES_SENT.name).increment(frame.len() as u64);
        trace!(len = frame.len(), "frame sent");
        Ok(())
    }

    /// Run one decode pass.
    ///
    /// Returns `Ok(None)` when no frame came out of this pass, whether the
    /// line was idle or a frame was dropped. Only transport failures are
    /// errors.
    pub fn poll(&mut self) -> HostResult<Option<Inbound<'_>>> {
        let resume = std::mem::take(&mut self.resume);
        let outcome = if resume {
            self.decoder
                .decode_after_delimiter(&mut self.transport, &mut self.rx_buf[..])
        } else {
            self.decoder.decode(&mut self.transport, &mut self.rx_buf[..])
        };

        if let Some(err) = self.transport.take_error() {
            return Err(HostError::Transport(err));
        }
        trace!(code = outcome_code(&outcome), resume, "decode pass");

        match outcome {
            Ok(Some(frame)) => {
                self.stats.frames_received += 1;
                metrics::counter!(metric_defs::FRAMES_RECEIVED.name).increment(1);
                Ok(Some(classify(&mut self.stats, frame)))
            }
            Ok(None) => {
                self.stats.no_data += 1;
                metrics::counter!(metric_defs::FRAMES_NO_DATA.name).increment(1);
                Ok(None)
            }
            Err(err) => {
                if record_fault(&mut self.stats, err) {
                    self.resume = self.resume_on_delimiter;
                    debug!(resume = self.resume, "frame cut short by delimiter");
                }
                Ok(None)
            }
        }
    }

    /// Running totals.
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// The decoder in use.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Receive buffer size.
    pub fn receive_buffer_len(&self) -> usize {
        self.rx_buf.len()
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Unwrap the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

// Free functions so a decoded frame can keep borrowing the receive buffer
// while the totals are updated.

fn classify<'a>(stats: &mut LinkStats, frame: ParsedFrame<'a>) -> Inbound<'a> {
    if !frame.is_receive_packet() {
        debug!(frame_type = frame.frame_type, len = frame.len(), "frame received");
        return frame.into();
    }
    match ReceivePacket::parse(&frame) {
        Ok(packet) => Inbound::Receive(packet),
        Err(err) => {
            stats.malformed += 1;
            warn!(len = frame.len(), "receive packet not parsed: {}", err);
            frame.into()
        }
    }
}

/// Count a decode fault. Returns true if it was a misplaced delimiter.
fn record_fault(stats: &mut LinkStats, err: DecodeError) -> bool {
    match err {
        DecodeError::UnexpectedDelimiter { offset } => {
            stats.framing_errors += 1;
            metrics::counter!(metric_defs::FRAMES_FRAMING_ERROR.name).increment(1);
            trace!(offset, "delimiter inside frame");
            true
        }
        DecodeError::ReservedFrameType => {
            stats.framing_errors += 1;
            metrics::counter!(metric_defs::FRAMES_FRAMING_ERROR.name).increment(1);
            debug!("frame without a frame type dropped");
            false
        }
        DecodeError::ChecksumMismatch { .. } => {
            stats.checksum_errors += 1;
            metrics::counter!(metric_defs::FRAMES_CHECKSUM_ERROR.name).increment(1);
            warn!(code = err.code(), "{}", err);
            false
        }
        DecodeError::Oversized { .. } => {
            stats.oversized += 1;
            metrics::counter!(metric_defs::FRAMES_OVERSIZED.name).increment(1);
            warn!(code = err.code(), "{}", err);
            false
        }
    }
}
