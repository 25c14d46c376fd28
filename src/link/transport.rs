//! Line transport abstraction
//!
//! A newline-delimited duplex channel. All reads are non-blocking: the
//! correlation engine only ever consumes what has already arrived.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("link not open: {0}")]
    Unavailable(String),

    #[error("link I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait LineTransport: Send {
    /// Write `line` followed by a single `\n`.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Next complete line without its terminator, or `None` if no complete
    /// line is available right now. Must not block.
    fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Number of received bytes not yet returned by `read_line`.
    fn pending_bytes(&mut self) -> Result<usize, TransportError>;

    /// Human readable endpoint, for logs and health output
    fn describe(&self) -> String;
}

impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).write_line(line)
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        (**self).read_line()
    }

    fn pending_bytes(&mut self) -> Result<usize, TransportError> {
        (**self).pending_bytes()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
