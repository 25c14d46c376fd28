//! Retry controller for commands that expect a reply
//!
//! Two tiers: the inner tier waits for a reply that may still be on its way,
//! the outer tier re-sends the command because the request line itself may
//! have been lost on the link.

use std::time::Duration;

use super::queue::InboundQueue;
use super::transport::{LineTransport, TransportError};
use crate::protocol::response::{ResponseRegistry, StatusResponse};

/// Delay between attempts and how many attempts a tier makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Same attempt count without any waiting
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(Duration::ZERO, max_attempts)
    }
}

/// Inner tier: 6 claim attempts, 0.5 s apart
pub const DEFAULT_INNER_POLICY: RetryPolicy = RetryPolicy::new(Duration::from_millis(500), 6);
/// Outer tier: up to 3 re-sends, 2 s apart
pub const DEFAULT_OUTER_POLICY: RetryPolicy = RetryPolicy::new(Duration::from_millis(2000), 3);

/// Result of a query cycle
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Last response claimed, `None` if both tiers ran out
    pub response: Option<StatusResponse>,
    /// Number of times the command was written
    pub sends: u32,
    /// Failed claim attempts across all tiers (diagnostic only)
    pub total_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryController {
    pub inner: RetryPolicy,
    pub outer: RetryPolicy,
}

impl Default for RetryController {
    fn default() -> Self {
        Self {
            inner: DEFAULT_INNER_POLICY,
            outer: DEFAULT_OUTER_POLICY,
        }
    }
}

impl RetryController {
    pub const fn new(inner: RetryPolicy, outer: RetryPolicy) -> Self {
        Self { inner, outer }
    }

    /// Send `command` and wait for a line under `signature`.
    ///
    /// The inner tier always makes at least one claim attempt. The outer tier
    /// re-sends at most `outer.max_attempts` times, so the command is written
    /// at most `outer.max_attempts + 1` times.
    pub async fn run<T>(
        &self,
        transport: &mut T,
        queue: &mut InboundQueue,
        registry: &ResponseRegistry,
        signature: &str,
        command: &str,
    ) -> Result<Exchange, TransportError>
    where
        T: LineTransport + ?Sized,
    {
        let inner_attempts = self.inner.max_attempts.max(1);
        let mut sends = 0;
        let mut total_retries = 0;
        let mut resends = 0;

        tracing::debug!("-> {}", command);
        transport.write_line(command)?;
        sends += 1;

        loop {
            let mut claimed = None;

            for attempt in 1..=inner_attempts {
                // a burst can carry several replies; keep the newest
                while let Some(response) = queue.try_claim(transport, registry, signature)? {
                    claimed = Some(response);
                }
                if claimed.is_some() {
                    break;
                }

                total_retries += 1;
                if attempt < inner_attempts {
                    tokio::time::sleep(self.inner.interval).await;
                }
            }

            if claimed.is_some() || resends >= self.outer.max_attempts {
                if claimed.is_none() {
                    tracing::warn!(
                        "No reply to {:?} after {} sends ({} retries)",
                        command,
                        sends,
                        total_retries
                    );
                }
                return Ok(Exchange {
                    response: claimed,
                    sends,
                    total_retries,
                });
            }

            resends += 1;
            tracing::debug!(
                "No reply to {:?} yet, re-sending ({}/{}, {} retries so far)",
                command,
                resends,
                self.outer.max_attempts,
                total_retries
            );
            tokio::time::sleep(self.outer.interval).await;
            InboundQueue::discard(transport)?;
            tracing::debug!("-> {}", command);
            transport.write_line(command)?;
            sends += 1;
        }
    }
}
