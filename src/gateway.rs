//! Gateway facade
//!
//! The one entry point the HTTP layer talks to. Every operation takes the link
//! lock for its whole lifecycle (write, settle, drain, match), so concurrent
//! callers are served strictly one after another: the link has no request ids
//! and an interleaved drain would swallow another request's reply.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{GatewayError, Result};
use crate::link::retry::RetryController;
use crate::link::{InboundQueue, LineTransport, DEFAULT_QUEUE_CAPACITY};
use crate::protocol::response::{ResponseRegistry, StatusResponse, STATUS_SIGNATURE};
use crate::protocol::{Color, CommandRequest, DeviceAddress, SceneId, SceneTable};

/// Pause after a fire-and-forget command before draining the link
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Pause after the startup wake-up line
pub const DEFAULT_WAKE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub settle: Duration,
    pub wake: Duration,
    pub retry: RetryController,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE_DELAY,
            wake: DEFAULT_WAKE_DELAY,
            retry: RetryController::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Normalized result payload handed back to the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub status: ReplyStatus,
    #[serde(flatten)]
    pub device: Option<StatusResponse>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            status: ReplyStatus::Ok,
            device: None,
        }
    }

    pub fn error() -> Self {
        Self {
            status: ReplyStatus::Error,
            device: None,
        }
    }

    pub fn status(response: StatusResponse) -> Self {
        Self {
            status: ReplyStatus::Ok,
            device: Some(response),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}

/// Transport and its unclaimed lines; always locked together
struct Link {
    transport: Box<dyn LineTransport>,
    queue: InboundQueue,
}

pub struct Gateway {
    link: Mutex<Link>,
    endpoint: String,
    scenes: SceneTable,
    responses: ResponseRegistry,
    timing: Timing,
}

impl Gateway {
    /// Gateway with the firmware scene table, the status parser and default timing
    pub fn new(transport: impl LineTransport + 'static) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: impl LineTransport + 'static) -> GatewayBuilder {
        GatewayBuilder {
            transport: Box::new(transport),
            scenes: SceneTable::default(),
            responses: ResponseRegistry::default(),
            timing: Timing::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Description of the link endpoint (e.g. serial device path)
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Scene names accepted by `set_scene`
    pub fn scenes(&self) -> &SceneTable {
        &self.scenes
    }

    /// Wake the JeeLink and flush its boot chatter.
    ///
    /// Returns the number of lines thrown away.
    pub async fn wake(&self) -> Result<usize> {
        let mut link = self.link.lock().await;
        link.transport.write_line("")?;
        tokio::time::sleep(self.timing.wake).await;
        let dropped = InboundQueue::discard(&mut *link.transport)?;
        tracing::info!("Link {} awake, flushed {} lines", self.endpoint, dropped);
        Ok(dropped)
    }

    /// Run any request kind
    pub async fn execute(&self, request: CommandRequest) -> Result<Reply> {
        match request {
            CommandRequest::GetStatus { address } => self.get_status(address).await,
            other => self.fire(&other).await,
        }
    }

    pub async fn set_color(&self, address: DeviceAddress, color: Color) -> Result<Reply> {
        tracing::info!(
            "Channel = {} Color=({},{},{})",
            address,
            color.red,
            color.green,
            color.blue
        );
        self.fire(&CommandRequest::SetColor { address, color }).await
    }

    pub async fn set_scene_id(&self, address: DeviceAddress, scene: SceneId) -> Result<Reply> {
        tracing::info!("Channel = {} SceneID={}", address, scene);
        self.fire(&CommandRequest::SetSceneId { address, scene }).await
    }

    pub async fn set_scene(&self, address: DeviceAddress, name: &str) -> Result<Reply> {
        tracing::info!("Channel = {} Scene={}", address, name);
        self.fire(&CommandRequest::SetScene {
            address,
            name: name.to_string(),
        })
        .await
    }

    pub async fn light_on(&self, address: DeviceAddress, switch: u8) -> Result<Reply> {
        tracing::info!("Channel = {} On switch={}", address, switch);
        self.fire(&CommandRequest::LightOn { address, switch }).await
    }

    pub async fn light_off(&self, address: DeviceAddress, switch: u8) -> Result<Reply> {
        tracing::info!("Channel = {} Off switch={}", address, switch);
        self.fire(&CommandRequest::LightOff { address, switch }).await
    }

    /// Query a node and wait for its status report.
    ///
    /// Fails with `StatusTimeout` once both retry tiers are exhausted.
    pub async fn get_status(&self, address: DeviceAddress) -> Result<Reply> {
        let line = CommandRequest::GetStatus { address }.encode(&self.scenes)?;

        let mut link = self.link.lock().await;
        let Link { transport, queue } = &mut *link;
        let exchange = self
            .timing
            .retry
            .run(&mut **transport, queue, &self.responses, STATUS_SIGNATURE, &line)
            .await?;

        match exchange.response {
            Some(response) => {
                tracing::info!(
                    "Channel = {} status from {} ({}) after {} sends",
                    address,
                    response.sender,
                    response.device_type,
                    exchange.sends
                );
                Ok(Reply::status(response))
            }
            None => Err(GatewayError::StatusTimeout {
                address,
                sends: exchange.sends,
            }),
        }
    }

    /// Lines received but not yet claimed by any request, oldest first
    pub async fn queued_lines(&self) -> Vec<String> {
        let link = self.link.lock().await;
        link.queue.lines().map(str::to_string).collect()
    }

    /// Send a command the device never acknowledges.
    async fn fire(&self, request: &CommandRequest) -> Result<Reply> {
        // encode before locking so a rejected request never touches the link
        let line = request.encode(&self.scenes)?;

        let mut link = self.link.lock().await;
        tracing::debug!("-> {}", line);
        link.transport.write_line(&line)?;
        tokio::time::sleep(self.timing.settle).await;
        let dropped = InboundQueue::discard(&mut *link.transport)?;
        if dropped > 0 {
            tracing::debug!("Discarded {} lines after {:?}", dropped, line);
        }
        Ok(Reply::ok())
    }
}

pub struct GatewayBuilder {
    transport: Box<dyn LineTransport>,
    scenes: SceneTable,
    responses: ResponseRegistry,
    timing: Timing,
    queue_capacity: usize,
}

impl GatewayBuilder {
    pub fn scenes(mut self, scenes: SceneTable) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn responses(mut self, responses: ResponseRegistry) -> Self {
        self.responses = responses;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Unclaimed lines kept per link before the oldest is evicted
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> Gateway {
        Gateway {
            endpoint: self.transport.describe(),
            link: Mutex::new(Link {
                transport: self.transport,
                queue: InboundQueue::with_capacity(self.queue_capacity),
            }),
            scenes: self.scenes,
            responses: self.responses,
            timing: self.timing,
        }
    }
}
