//! Link telemetry.
//!
//! Every counter is declared once as a const [`Metric`] in [`metric_defs`].
//! Without an installed recorder the `metrics` macros are no-ops, so the
//! link counts unconditionally.

use metrics::{describe_counter, Unit};

/// A counter declaration with its metadata.
///
/// ```rust
/// use xbee_host::Metric;
/// use metrics::Unit;
///
/// const RETRIES: Metric = Metric::counter("xbee.retries")
///     .with_description("Transmit retries")
///     .with_unit(Unit::Count);
///
/// assert_eq!(RETRIES.unit, Some(Unit::Count));
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Counter name.
    pub name: &'static str,
    /// What the counter counts.
    pub description: &'static str,
    /// Unit of the increments, if any.
    pub unit: Option<Unit>,
}

impl Metric {
    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            description: "",
            unit: None,
        }
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match self.unit {
            Some(unit) => describe_counter!(self.name, unit, self.description),
            None => describe_counter!(self.name, self.description),
        }
    }
}

/// All metrics the link records.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Frames
    // ========================================================================

    /// Transmit request frames written to the transport.
    pub const FRAMES_SENT: Metric = Metric::counter("xbee.frames.sent")
        .with_description("Transmit request frames written to the transport")
        .with_unit(Unit::Count);

    /// Frames decoded with a valid checksum.
    pub const FRAMES_RECEIVED: Metric = Metric::counter("xbee.frames.received")
        .with_description("Frames decoded with a valid checksum")
        .with_unit(Unit::Count);

    /// Receive polls that ended without a frame.
    pub const FRAMES_NO_DATA: Metric = Metric::counter("xbee.frames.no_data")
        .with_description("Receive polls that ended without a frame")
        .with_unit(Unit::Count);

    /// Frames abandoned on a misplaced delimiter or reserved frame type.
    pub const FRAMES_FRAMING_ERROR: Metric = Metric::counter("xbee.frames.framing_error")
        .with_description("Frames abandoned on a misplaced delimiter or reserved frame type")
        .with_unit(Unit::Count);

    /// Frames dropped on a checksum mismatch.
    pub const FRAMES_CHECKSUM_ERROR: Metric = Metric::counter("xbee.frames.checksum_error")
        .with_description("Frames dropped on a checksum mismatch")
        .with_unit(Unit::Count);

    /// Frames whose declared length exceeded the receive buffer.
    pub const FRAMES_OVERSIZED: Metric = Metric::counter("xbee.frames.oversized")
        .with_description("Frames whose declared length exceeded the receive buffer")
        .with_unit(Unit::Count);

    // ========================================================================
    // Bytes
    // ========================================================================

    /// Encoded bytes written to the transport.
    pub const BYTES_SENT: Metric = Metric::counter("xbee.bytes.sent")
        .with_description("Encoded bytes written to the transport")
        .with_unit(Unit::Bytes);

    /// Every metric above.
    pub const ALL: &[&Metric] = &[
        &FRAMES_SENT,
        &FRAMES_RECEIVED,
        &FRAMES_NO_DATA,
        &FRAMES_FRAMING_ERROR,
        &FRAMES_CHECKSUM_ERROR,
        &FRAMES_OVERSIZED,
        &BYTES_SENT,
    ];
}

/// Register descriptions for every metric in [`metric_defs::ALL`].
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
