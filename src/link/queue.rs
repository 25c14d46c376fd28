//! Inbound line queue and response matcher
//!
//! Lines arrive from the link at any time, unsolicited or late. They are
//! buffered here in arrival order until a request claims one by signature.
//! The buffer is bounded: once full, the oldest line is evicted.

use std::collections::VecDeque;

use super::transport::{LineTransport, TransportError};
use crate::protocol::response::{ResponseRegistry, StatusResponse};

/// Unclaimed lines kept before the oldest is evicted
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

#[derive(Debug)]
pub struct InboundQueue {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl InboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue holding at most `capacity` lines (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Buffered lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Read and drop every line the transport has right now.
    ///
    /// Returns the number of lines dropped.
    pub fn discard<T>(transport: &mut T) -> Result<usize, TransportError>
    where
        T: LineTransport + ?Sized,
    {
        let mut dropped = 0;
        drain_available(transport, |line| {
            tracing::debug!("<- {} (discarded)", line);
            dropped += 1;
        })?;
        Ok(dropped)
    }

    /// Append every non-empty line the transport has right now, evicting the
    /// oldest lines past capacity.
    ///
    /// Returns the number of lines queued.
    pub fn fill<T>(&mut self, transport: &mut T) -> Result<usize, TransportError>
    where
        T: LineTransport + ?Sized,
    {
        let mut queued = 0;
        drain_available(transport, |line| {
            if line.is_empty() {
                return;
            }
            tracing::debug!("<- {}", line);
            self.push(line);
            queued += 1;
        })?;
        Ok(queued)
    }

    /// Drain the transport, then remove and parse the oldest line classified
    /// under `signature`.
    ///
    /// Candidates that fail to parse are dropped and the scan carries on; they
    /// are never returned and never left in the queue. Lines of other kinds
    /// stay queued untouched.
    pub fn try_claim<T>(
        &mut self,
        transport: &mut T,
        registry: &ResponseRegistry,
        signature: &str,
    ) -> Result<Option<StatusResponse>, TransportError>
    where
        T: LineTransport + ?Sized,
    {
        self.fill(transport)?;

        let mut index = 0;
        while index < self.lines.len() {
            if registry.classify(&self.lines[index]) != Some(signature) {
                index += 1;
                continue;
            }

            let Some(line) = self.lines.remove(index) else {
                break;
            };
            match registry.parse(signature, &line) {
                Some(Ok(response)) => return Ok(Some(response)),
                Some(Err(e)) => {
                    tracing::warn!("Dropping unparseable response {:?}: {}", line, e);
                }
                None => {
                    tracing::warn!("No parser for {:?}, dropping {:?}", signature, line);
                }
            }
        }

        Ok(None)
    }

    fn push(&mut self, line: String) {
        while self.lines.len() >= self.capacity {
            match self.lines.pop_front() {
                Some(evicted) => tracing::debug!("Queue full, evicting {:?}", evicted),
                None => break,
            }
        }
        self.lines.push_back(line);
    }
}

/// Feed lines to `sink` while the transport reports pending bytes.
///
/// Stops early when bytes are pending but no full line has arrived yet, so a
/// partial line never makes this spin.
fn drain_available<T, F>(transport: &mut T, mut sink: F) -> Result<(), TransportError>
where
    T: LineTransport + ?Sized,
    F: FnMut(String),
{
    while transport.pending_bytes()? > 0 {
        match transport.read_line()? {
            Some(line) => sink(line),
            None => break,
        }
    }
    Ok(())
}
