//! Byte transports for the link.
//!
//! The module's serial port is reached through a serial-to-TCP bridge; the
//! in-memory transport replays scripted bytes for tests and dry runs.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use xbee_frame::{ByteTimeoutSource, IoSource, ScriptedSource, WaitBudget};

/// Delay before retrying a write the socket could not take yet.
const WRITE_RETRY_DELAY: Duration = Duration::from_micros(100);

/// A full-duplex byte channel: bounded-wait reads and whole-frame writes.
pub trait Transport: ByteTimeoutSource {
    /// Write all of `data`.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Take a failure the read side ran into, if any.
    ///
    /// Reads report only "byte" or "no byte"; hard errors and a closed peer
    /// surface here.
    fn take_error(&mut self) -> Option<io::Error> {
        None
    }
}

// ============================================================================
// TCP
// ============================================================================

/// Serial port exposed over TCP (ser2net, a simulator UART port, ...).
#[derive(Debug)]
pub struct TcpTransport {
    source: IoSource<TcpStream>,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Connect to a bridge and switch the socket to non-blocking reads.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        Ok(TcpTransport {
            source: IoSource::new(stream),
            peer,
        })
    }

    /// Address of the bridge.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl ByteTimeoutSource for TcpTransport {
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8> {
        self.source.try_read_byte(budget)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, mut data: &[u8]) -> io::Result<()> {
        let stream = self.source.get_mut();
        while !data.is_empty() {
            match stream.write(data) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(WRITE_RETRY_DELAY)
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        stream.flush()
    }

    fn take_error(&mut self) -> Option<io::Error> {
        if let Some(err) = self.source.take_error() {
            return Some(err);
        }
        if self.source.saw_zero_read() {
            return Some(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "bridge closed the connection",
            ));
        }
        None
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Transport backed by a scripted inbound stream and a byte vector.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: ScriptedSource,
    outbound: Vec<u8>,
    writes: usize,
}

impl MemoryTransport {
    /// Create a transport that reads from `inbound`.
    pub fn new(inbound: ScriptedSource) -> Self {
        MemoryTransport {
            inbound,
            outbound: Vec::new(),
            writes: 0,
        }
    }

    /// Queue more inbound bytes.
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.push_bytes(data);
    }

    /// Everything written so far.
    pub fn outbound(&self) -> &[u8] {
        &self.outbound
    }

    /// Number of `send` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// The inbound script, for poll accounting.
    pub fn inbound(&self) -> &ScriptedSource {
        &self.inbound
    }
}

impl ByteTimeoutSource for MemoryTransport {
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8> {
        self.inbound.try_read_byte(budget)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.outbound.extend_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn test_memory_transport() {
        let mut transport = MemoryTransport::new(ScriptedSource::new().bytes(&[0x7E]));
        transport.send(&[1, 2, 3]).unwrap();
        transport.send(&[4]).unwrap();
        assert_eq!(transport.outbound(), &[1, 2, 3, 4]);
        assert_eq!(transport.writes(), 2);

        let budget = WaitBudget::new(Duration::ZERO, 1);
        assert_eq!(transport.try_read_byte(budget), Some(0x7E));
        assert_eq!(transport.try_read_byte(budget), None);
        transport.push_inbound(&[0x01]);
        assert_eq!(transport.try_read_byte(budget), Some(0x01));
        assert!(transport.take_error().is_none());
    }

    #[test]
    fn test_tcp_transport_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut transport = TcpTransport::connect(addr).unwrap();
        let (mut peer, _) = listener.accept().unwrap();
        assert_eq!(transport.peer_addr(), addr);

        transport.send(&[0x7E, 0x00, 0x01]).unwrap();
        let mut received = [0u8; 3];
        peer.read_exact(&mut received).unwrap();
        assert_eq!(received, [0x7E, 0x00, 0x01]);

        peer.write_all(&[0xAB]).unwrap();
        let budget = WaitBudget::new(Duration::from_millis(1), 2000);
        assert_eq!(transport.try_read_byte(budget), Some(0xAB));

        // Nothing pending: times out without error
        let short = WaitBudget::new(Duration::from_micros(10), 5);
        assert_eq!(transport.try_read_byte(short), None);
        assert!(transport.take_error().is_none());

        drop(peer);
        assert_eq!(transport.try_read_byte(budget), None);
        let err = transport.take_error().expect("closed peer should be reported");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
