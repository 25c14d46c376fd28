//! Wire protocol of the light nodes: outbound commands, scene names and
//! inbound response parsing.

pub mod command;
pub mod response;
pub mod scene;

pub use command::{Color, CommandRequest, DeviceAddress, SceneId};
pub use response::{ResponseRegistry, StatusResponse, STATUS_SIGNATURE};
pub use scene::SceneTable;
