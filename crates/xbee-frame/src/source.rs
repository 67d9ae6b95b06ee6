//! Byte sources with a bounded wait.
//!
//! The decoder reads one raw byte at a time through [`ByteTimeoutSource`].
//! Each read may wait for data, but never longer than its [`WaitBudget`]:
//! the source checks for a byte up to `max_polls + 1` times and sleeps
//! `poll_interval` between checks.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::Duration;

/// Per-byte wait budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBudget {
    /// Delay between two availability checks.
    pub poll_interval: Duration,
    /// Number of delays before giving up.
    pub max_polls: u32,
}

impl WaitBudget {
    /// Default delay between checks. About one byte time at 115200 baud.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(8);
    /// Default number of delays before a byte wait times out.
    pub const DEFAULT_MAX_POLLS: u32 = 1000;

    /// Create a new budget.
    pub fn new(poll_interval: Duration, max_polls: u32) -> Self {
        WaitBudget {
            poll_interval,
            max_polls,
        }
    }

    /// Longest time a single byte wait can take.
    pub fn timeout(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_polls)
    }
}

impl Default for WaitBudget {
    fn default() -> Self {
        WaitBudget::new(Self::DEFAULT_POLL_INTERVAL, Self::DEFAULT_MAX_POLLS)
    }
}

/// A byte-at-a-time input with a bounded wait.
pub trait ByteTimeoutSource {
    /// Read the next raw byte, waiting at most `budget`.
    ///
    /// Returns `None` if no byte arrived in time.
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8>;
}

impl<S: ByteTimeoutSource + ?Sized> ByteTimeoutSource for &mut S {
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8> {
        (**self).try_read_byte(budget)
    }
}

impl<S: ByteTimeoutSource + ?Sized> ByteTimeoutSource for Box<S> {
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8> {
        (**self).try_read_byte(budget)
    }
}

// ============================================================================
// In-memory Sources
// ============================================================================

/// Replays a byte slice. Every read after the end times out immediately.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Create a source over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns true once every byte has been read.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl ByteTimeoutSource for SliceSource<'_> {
    fn try_read_byte(&mut self, _budget: WaitBudget) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }
}

/// One step of a [`ScriptedSource`] script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A byte that is available immediately.
    Byte(u8),
    /// No data for this many polls. Shorter than the budget, the wait
    /// absorbs it; longer, the read times out and the rest carries over.
    Stall(u32),
    /// Forces exactly one read to time out.
    Timeout,
}

/// Replays a script of bytes and gaps without sleeping.
///
/// Counts the polls it would have slept for, so wait bounds can be checked
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    polls: u64,
    reads: u64,
}

impl ScriptedSource {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the script.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.steps.extend(data.iter().map(|&b| Step::Byte(b)));
        self
    }

    /// Append a stall of `polls` polls.
    pub fn stall(mut self, polls: u32) -> Self {
        self.steps.push_back(Step::Stall(polls));
        self
    }

    /// Append a forced timeout.
    pub fn timeout(mut self) -> Self {
        self.steps.push_back(Step::Timeout);
        self
    }

    /// Append bytes to a script already in use.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.steps.extend(data.iter().map(|&b| Step::Byte(b)));
    }

    /// Total polls spent waiting so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Number of `try_read_byte` calls so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Returns true once the whole script has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.steps.is_empty()
    }

    /// Bytes left in the script, gaps skipped.
    pub fn remaining_bytes(&self) -> Vec<u8> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

impl ByteTimeoutSource for ScriptedSource {
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8> {
        self.reads += 1;
        let mut waited: u32 = 0;
        loop {
            let left = budget.max_polls - waited;
            match self.steps.front_mut() {
                Some(Step::Byte(b)) => {
                    let byte = *b;
                    self.steps.pop_front();
                    return Some(byte);
                }
                Some(Step::Stall(n)) if *n <= left => {
                    waited += *n;
                    self.polls += u64::from(*n);
                    self.steps.pop_front();
                }
                Some(Step::Stall(n)) => {
                    *n -= left;
                    self.polls += u64::from(left);
                    return None;
                }
                Some(Step::Timeout) => {
                    self.steps.pop_front();
                    self.polls += u64::from(left);
                    return None;
                }
                None => {
                    self.polls += u64::from(left);
                    return None;
                }
            }
        }
    }
}

// ============================================================================
// I/O Adapter
// ============================================================================

/// Bounded poll-and-delay loop over a non-blocking reader.
///
/// `WouldBlock`, `TimedOut` and `Interrupted` count as "no byte yet". A
/// zero-length read ends the wait at once, since on a stream it means the
/// peer is gone. Any other error also ends the wait and is kept for the owner
/// to inspect with [`IoSource::take_error`].
#[derive(Debug)]
pub struct IoSource<R> {
    reader: R,
    error: Option<io::Error>,
    zero_read: bool,
}

impl<R: Read> IoSource<R> {
    /// Wrap a reader. The reader should be non-blocking, or have a read
    /// timeout well below the wait budget.
    pub fn new(reader: R) -> Self {
        IoSource {
            reader,
            error: None,
            zero_read: false,
        }
    }

    /// Take the last hard I/O error, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Returns true if the most recent read returned zero bytes.
    ///
    /// On stream sockets this means the peer closed the connection.
    pub fn saw_zero_read(&self) -> bool {
        self.zero_read
    }

    /// Get a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the inner reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwrap the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteTimeoutSource for IoSource<R> {
    fn try_read_byte(&mut self, budget: WaitBudget) -> Option<u8> {
        let mut byte = [0u8; 1];
        for poll in 0..=budget.max_polls {
            match self.reader.read(&mut byte) {
                Ok(1) => {
                    self.zero_read = false;
                    return Some(byte[0]);
                }
                Ok(_) => {
                    self.zero_read = true;
                    return None;
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    log::debug!("byte source read failed: {}", e);
                    self.error = Some(e);
                    return None;
                }
            }
            if poll < budget.max_polls {
                std::thread::sleep(budget.poll_interval);
            }
        }
        None
    }
}
