//! Link configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty file is a valid
//! receive-only configuration:
//!
//! ```yaml
//! connect: 127.0.0.1:9750
//! wait:
//!   poll_interval_us: 8
//!   max_polls: 1000
//! max_discard: 512
//! receive_buffer: 300
//! send:
//!   interval_ms: 2000
//!   frame_id: 0
//!   dest64: 0013A20041F217CC
//!   dest16: FFFE
//!   message: hello
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xbee_frame::{
    Address16, Address64, DecoderConfig, TransmitRequest, WaitBudget, MAX_PAYLOAD_SIZE,
};

use crate::error::{HostError, HostResult};

/// Default address of the serial-to-TCP bridge.
pub const DEFAULT_CONNECT: &str = "127.0.0.1:9750";

/// Default receive buffer size in bytes.
pub const DEFAULT_RECEIVE_BUFFER: usize = 300;

// ============================================================================
// Configuration Types
// ============================================================================

/// Top-level link configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// `host:port` of the bridge exposing the module's serial port.
    pub connect: String,
    /// Per-byte wait budget.
    pub wait: WaitConfig,
    /// Most bytes dropped per poll while looking for a frame start.
    pub max_discard: Option<usize>,
    /// Receive buffer size (content plus checksum).
    pub receive_buffer: usize,
    /// Resume from a misplaced delimiter instead of reseeking.
    pub resume_on_delimiter: bool,
    /// Periodic transmit settings. `None` runs receive-only.
    pub send: Option<SendConfig>,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            connect: DEFAULT_CONNECT.to_string(),
            wait: WaitConfig::default(),
            max_discard: None,
            receive_buffer: DEFAULT_RECEIVE_BUFFER,
            resume_on_delimiter: true,
            send: None,
        }
    }
}

/// Per-byte wait budget, in config units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    /// Delay between availability checks, in microseconds.
    pub poll_interval_us: u64,
    /// Number of delays before a byte wait times out.
    pub max_polls: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        let budget = WaitBudget::default();
        WaitConfig {
            poll_interval_us: budget.poll_interval.as_micros() as u64,
            max_polls: budget.max_polls,
        }
    }
}

impl WaitConfig {
    /// Convert to the decoder's budget type.
    pub fn budget(&self) -> WaitBudget {
        WaitBudget::new(Duration::from_micros(self.poll_interval_us), self.max_polls)
    }
}

/// Periodic transmit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SendConfig {
    /// Time between transmissions, in milliseconds.
    pub interval_ms: u64,
    /// Frame id. 0 requests no transmit status.
    pub frame_id: u8,
    /// Destination 64-bit address, hex.
    pub dest64: String,
    /// Destination 16-bit address, hex.
    pub dest16: String,
    /// Message text sent as the payload.
    pub message: String,
}

impl Default for SendConfig {
    fn default() -> Self {
        SendConfig {
            interval_ms: 2000,
            frame_id: 0,
            dest64: Address64::BROADCAST.to_string(),
            dest16: Address16::UNKNOWN.to_string(),
            message: String::new(),
        }
    }
}

impl SendConfig {
    /// Time between transmissions.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Build the transmit request described by this config.
    pub fn request(&self) -> HostResult<TransmitRequest<'_>> {
        let dest64: Address64 = self.dest64.parse()?;
        let dest16: Address16 = self.dest16.parse()?;
        Ok(TransmitRequest::new(
            self.frame_id,
            dest64,
            dest16,
            self.message.as_bytes(),
        )?)
    }
}

// ============================================================================
// Loading and Validation
// ============================================================================

impl HostConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse and validate YAML config text.
    pub fn from_yaml(text: &str) -> HostResult<Self> {
        let config: HostConfig = if text.trim().is_empty() {
            HostConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values the types alone do not constrain.
    pub fn validate(&self) -> HostResult<()> {
        if self.connect.trim().is_empty() {
            return Err(HostError::config("connect address is empty"));
        }
        if self.wait.max_polls == 0 {
            return Err(HostError::config("wait.max_polls must be positive"));
        }
        if self.receive_buffer < 2 {
            return Err(HostError::config(
                "receive_buffer must hold at least a frame type and a checksum",
            ));
        }
        if self.max_discard == Some(0) {
            return Err(HostError::config(
                "max_discard of 0 would never reach a delimiter",
            ));
        }
        if let Some(send) = &self.send {
            if send.interval_ms == 0 {
                return Err(HostError::config("send.interval_ms must be positive"));
            }
            if send.message.len() > MAX_PAYLOAD_SIZE {
                return Err(HostError::config(format!(
                    "send.message is {} bytes, maximum is {}",
                    send.message.len(),
                    MAX_PAYLOAD_SIZE
                )));
            }
            send.request()?;
        }
        Ok(())
    }

    /// Decoder settings for this config.
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            budget: self.wait.budget(),
            max_discard: self.max_discard,
        }
    }
}
