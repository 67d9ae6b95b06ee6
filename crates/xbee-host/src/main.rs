use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xbee_host::{
    describe_metrics, HostConfig, HostError, HostResult, Inbound, Link, SendConfig, SendTimer,
    TcpTransport,
};

#[derive(Parser, Debug)]
#[command(name = "xbee-host", about = "Drive an XBee module in API 2 mode over a serial bridge")]
struct Args {
    /// YAML config file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial bridge address (host:port)
    #[arg(long)]
    connect: Option<String>,

    /// Destination 64-bit address, hex
    #[arg(long)]
    dest64: Option<String>,

    /// Destination 16-bit address, hex
    #[arg(long)]
    dest16: Option<String>,

    /// Message to send periodically. Enables sending.
    #[arg(short, long)]
    message: Option<String>,

    /// Milliseconds between transmissions
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Frame id for transmit requests (0 disables transmit status)
    #[arg(long)]
    frame_id: Option<u8>,
}

impl Args {
    fn resolve(&self) -> HostResult<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)?,
            None => HostConfig::default(),
        };

        if let Some(connect) = &self.connect {
            config.connect = connect.clone();
        }

        let wants_send = self.message.is_some()
            || self.dest64.is_some()
            || self.dest16.is_some()
            || self.interval_ms.is_some()
            || self.frame_id.is_some();
        if wants_send {
            let send = config.send.get_or_insert_with(SendConfig::default);
            if let Some(message) = &self.message {
                send.message = message.clone();
            }
            if let Some(dest64) = &self.dest64 {
                send.dest64 = dest64.clone();
            }
            if let Some(dest16) = &self.dest16 {
                send.dest16 = dest16.clone();
            }
            if let Some(interval_ms) = self.interval_ms {
                send.interval_ms = interval_ms;
            }
            if let Some(frame_id) = self.frame_id {
                send.frame_id = frame_id;
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> HostResult<()> {
    let config = args.resolve()?;
    describe_metrics();

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .map_err(|e| HostError::Setup(format!("failed to install Ctrl-C handler: {}", e)))?;

    let transport = TcpTransport::connect(config.connect.as_str())?;
    tracing::info!("Connected to {}", transport.peer_addr());
    let mut link = Link::from_config(transport, &config);

    // The payload never changes, so the frame is encoded once
    let mut outgoing = match &config.send {
        Some(send) => {
            let request = send.request()?;
            tracing::info!(
                "Sending {} bytes to {}/{} every {} ms",
                request.payload().len(),
                request.dest64,
                request.dest16,
                send.interval_ms
            );
            let mut timer = SendTimer::new(send.interval());
            timer.start();
            Some((request.encode(), timer))
        }
        None => {
            tracing::info!("No send section, receiving only");
            None
        }
    };

    while running.load(Ordering::SeqCst) {
        if let Some((frame, timer)) = outgoing.as_mut() {
            if timer.just_finished() {
                link.send_encoded(frame)?;
                tracing::debug!("Sent frame {} ({} bytes)", timer.fired(), frame.len());
            }
        }

        match link.poll()? {
            Some(Inbound::Receive(packet)) => {
                tracing::info!(
                    "Received {} bytes from {}/{}",
                    packet.data.len(),
                    packet.source64,
                    packet.source16
                );
            }
            Some(Inbound::Other { frame_type, content }) => {
                tracing::debug!(
                    "Ignoring frame type 0x{:02X} ({} bytes)",
                    frame_type,
                    content.len()
                );
            }
            None => {}
        }
    }

    let stats = link.stats();
    tracing::info!(
        "Stopped: sent {} frames ({} bytes), received {}, dropped {}",
        stats.frames_sent,
        stats.bytes_sent,
        stats.frames_received,
        stats.dropped()
    );
    Ok(())
}
