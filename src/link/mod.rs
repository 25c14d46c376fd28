//! Serial link plumbing: transport, inbound queue and reply retries.

pub mod queue;
pub mod retry;
pub mod serial;
pub mod transport;

pub use queue::{InboundQueue, DEFAULT_QUEUE_CAPACITY};
pub use retry::{Exchange, RetryController, RetryPolicy};
pub use serial::SerialTransport;
pub use transport::{LineTransport, TransportError};
