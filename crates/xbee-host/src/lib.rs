//! Host-side driver for an XBee module in API 2 mode.
//!
//! Wraps the [`xbee_frame`] codec with what a running link needs: YAML
//! configuration, a serial-over-TCP transport, a polling [`Link`], a periodic
//! [`SendTimer`] and outcome counters through the `metrics` facade.
//!
//! ```rust
//! use std::time::Duration;
//! use xbee_frame::{FrameDecoder, ScriptedSource, TransmitRequest, WaitBudget};
//! use xbee_host::{Inbound, Link, MemoryTransport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = TransmitRequest::broadcast(b"ping")?;
//!
//! // Loop the encoded frame back into the receive side
//! let inbound = ScriptedSource::new().bytes(&request.encode());
//! let decoder = FrameDecoder::with_budget(WaitBudget::new(Duration::ZERO, 4));
//! let mut link = Link::new(MemoryTransport::new(inbound), decoder, 64);
//!
//! link.send(&request)?;
//! match link.poll()? {
//!     Some(Inbound::Other { frame_type, .. }) => assert_eq!(frame_type, 0x10),
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod schedule;
pub mod telemetry;
pub mod transport;

pub use config::{HostConfig, SendConfig, WaitConfig};
pub use error::{HostError, HostResult};
pub use link::{Inbound, Link, LinkStats};
pub use schedule::SendTimer;
pub use telemetry::{describe_metrics, metric_defs, Metric};
pub use transport::{MemoryTransport, TcpTransport, Transport};
