//! Outbound command encoding
//!
//! Builds the exact wire text for each command kind. The newline terminator
//! is appended by the transport, not here.

use std::fmt;

use serde::Serialize;

use crate::error::{GatewayError, Result};
use crate::protocol::scene::SceneTable;

/// Highest node address on the link
pub const MAX_ADDRESS: u8 = 127;
/// Highest scene id understood by the firmware
pub const MAX_SCENE_ID: u8 = 18;

/// Address of a remote node (0-127)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DeviceAddress {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        if value <= MAX_ADDRESS {
            Ok(Self(value))
        } else {
            Err(value)
        }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Preprogrammed scene id (0-18)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SceneId(u8);

impl SceneId {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SceneId {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        if value <= MAX_SCENE_ID {
            Ok(Self(value))
        } else {
            Err(value)
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RGB color, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// One request to the light link, already range-checked by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    SetColor {
        address: DeviceAddress,
        color: Color,
    },
    SetSceneId {
        address: DeviceAddress,
        scene: SceneId,
    },
    SetScene {
        address: DeviceAddress,
        name: String,
    },
    LightOn {
        address: DeviceAddress,
        switch: u8,
    },
    LightOff {
        address: DeviceAddress,
        switch: u8,
    },
    GetStatus {
        address: DeviceAddress,
    },
}

impl CommandRequest {
    /// Render the wire line for this command.
    ///
    /// Fails only for `SetScene` with a name missing from `scenes`.
    pub fn encode(&self, scenes: &SceneTable) -> Result<String> {
        let line = match self {
            Self::SetColor { address, color } => {
                on_line(*address, color.red, color.green, color.blue)
            }
            Self::LightOn { address, switch } => on_line(*address, *switch, 1, 1),
            Self::LightOff { address, switch } => on_line(*address, *switch, 0, 0),
            Self::SetSceneId { address, scene } => scene_line(*address, *scene),
            Self::SetScene { address, name } => {
                let scene = scenes
                    .lookup(name)
                    .ok_or_else(|| GatewayError::UnknownScene(name.clone()))?;
                scene_line(*address, scene)
            }
            Self::GetStatus { address } => format!("STATUS {}", address),
        };
        Ok(line)
    }
}

fn on_line(address: DeviceAddress, a: u8, b: u8, c: u8) -> String {
    format!("ON {} 100 {},{},{}", address, a, b, c)
}

fn scene_line(address: DeviceAddress, scene: SceneId) -> String {
    format!("SCENE {} {}", address, scene)
}
