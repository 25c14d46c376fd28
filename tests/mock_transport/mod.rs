#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]
//! Scripted in-memory line transport
//!
//! Simulates the JeeLink side of the serial link: records every written line
//! and lets a test decide which lines the "device" emits, either up front or
//! in response to a write.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use lightgw::link::{LineTransport, TransportError};

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

#[derive(Default)]
struct MockState {
    written: Vec<String>,
    inbound: VecDeque<String>,
    responder: Option<Responder>,
    /// Bytes reported as pending although no full line ever arrives
    partial_bytes: usize,
    fail_writes: bool,
}

/// Cloneable handle: give one clone to the gateway, keep one for assertions
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line as if the device had already sent it
    pub fn push_inbound(&self, line: &str) {
        self.state.lock().unwrap().inbound.push_back(line.to_string());
    }

    /// Lines produced for each written command
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        self.state.lock().unwrap().responder = Some(Box::new(responder));
    }

    /// Report bytes pending that never form a complete line
    pub fn set_partial_bytes(&self, n: usize) {
        self.state.lock().unwrap().partial_bytes = n;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn written(&self) -> Vec<String> {
        self.state.lock().unwrap().written.clone()
    }

    pub fn written_matching(&self, prefix: &str) -> usize {
        self.written().iter().filter(|l| l.starts_with(prefix)).count()
    }

    pub fn unread(&self) -> Vec<String> {
        self.state.lock().unwrap().inbound.iter().cloned().collect()
    }
}

impl LineTransport for MockTransport {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(TransportError::Unavailable("mock link down".to_string()));
        }
        state.written.push(line.to_string());
        let replies = match state.responder.as_mut() {
            Some(responder) => responder(line),
            None => Vec::new(),
        };
        state.inbound.extend(replies);
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.state.lock().unwrap().inbound.pop_front())
    }

    fn pending_bytes(&mut self) -> Result<usize, TransportError> {
        let state = self.state.lock().unwrap();
        let complete: usize = state.inbound.iter().map(|l| l.len() + 1).sum();
        Ok(complete + state.partial_bytes)
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
