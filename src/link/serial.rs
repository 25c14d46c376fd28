//! Serial port transport (JeeLink on a USB serial adapter)
//!
//! Port I/O is synchronous and runs on the calling task while the gateway
//! holds the link lock. Reads only ever take what `bytes_to_read` reports, so
//! the only calls that can block are writes, bounded by `PORT_TIMEOUT`.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use super::transport::{LineTransport, TransportError};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
const PORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial link that reopens itself after an I/O failure.
///
/// Received bytes are buffered until a `\n` arrives, so a line split across
/// two reads is returned whole.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    buffer: Vec<u8>,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`.
    pub fn open(path: impl Into<String>, baud_rate: u32) -> Result<Self, TransportError> {
        let mut transport = Self {
            path: path.into(),
            baud_rate,
            port: None,
            buffer: Vec::new(),
        };
        transport.ensure_open()?;
        Ok(transport)
    }

    fn ensure_open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(self.path.as_str(), self.baud_rate)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|e| TransportError::Unavailable(format!("{}: {}", self.path, e)))?;

        tracing::info!("Serial port {} open at {} baud", self.path, self.baud_rate);
        self.buffer.clear();
        self.port = Some(port);
        Ok(())
    }

    /// Drop the port so the next call reopens it.
    fn mark_broken(&mut self, err: std::io::Error) -> TransportError {
        tracing::warn!("Serial port {} failed: {}", self.path, err);
        self.port = None;
        self.buffer.clear();
        TransportError::Io(err)
    }

    fn os_pending(&mut self) -> Result<usize, TransportError> {
        self.ensure_open()?;
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::Unavailable(self.path.clone()));
        };
        match port.bytes_to_read() {
            Ok(n) => Ok(n as usize),
            Err(e) => Err(self.mark_broken(e.into())),
        }
    }

    /// Move whatever the OS has received into the line buffer.
    fn fill_buffer(&mut self) -> Result<(), TransportError> {
        let available = self.os_pending()?;
        if available == 0 {
            return Ok(());
        }

        let mut chunk = vec![0u8; available];
        let read = match self.port.as_mut() {
            Some(port) => port.read(&mut chunk),
            None => return Err(TransportError::Unavailable(self.path.clone())),
        };
        match read {
            Ok(n) => {
                self.buffer.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(()),
            Err(e) => Err(self.mark_broken(e)),
        }
    }
}

impl LineTransport for SerialTransport {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.ensure_open()?;
        let result = match self.port.as_mut() {
            Some(port) => port
                .write_all(line.as_bytes())
                .and_then(|()| port.write_all(b"\n"))
                .and_then(|()| port.flush()),
            None => return Err(TransportError::Unavailable(self.path.clone())),
        };
        result.map_err(|e| self.mark_broken(e))
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        self.fill_buffer()?;
        Ok(take_line(&mut self.buffer))
    }

    fn pending_bytes(&mut self) -> Result<usize, TransportError> {
        Ok(self.os_pending()? + self.buffer.len())
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path, self.baud_rate)
    }
}

/// Split the first `\n`-terminated line off `buffer`, dropping a trailing `\r`.
fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let end = buffer.iter().position(|&b| b == b'\n')?;
    let mut raw: Vec<u8> = buffer.drain(..=end).collect();
    raw.pop();
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    Some(String::from_utf8_lossy(&raw).into_owned())
}
