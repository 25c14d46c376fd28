//! Configuration management
//!
//! Layered: built-in defaults, then `config.{toml,json,yaml}` in the config
//! directory, then `LIGHTGW_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::gateway::Timing;
use crate::link::retry::{RetryController, RetryPolicy};
use crate::link::serial::DEFAULT_BAUD_RATE;
use crate::link::DEFAULT_QUEUE_CAPACITY;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_serial_path")]
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Unclaimed inbound lines kept before the oldest is evicted
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_serial_path() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: default_serial_path(),
            baud_rate: default_baud_rate(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Link timing, all delays in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub settle_ms: u64,
    pub wake_ms: u64,
    pub inner_interval_ms: u64,
    pub inner_attempts: u32,
    pub outer_interval_ms: u64,
    pub outer_attempts: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            settle_ms: millis(timing.settle),
            wake_ms: millis(timing.wake),
            inner_interval_ms: millis(timing.retry.inner.interval),
            inner_attempts: timing.retry.inner.max_attempts,
            outer_interval_ms: millis(timing.retry.outer.interval),
            outer_attempts: timing.retry.outer.max_attempts,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl TimingConfig {
    pub fn to_timing(&self) -> Timing {
        Timing {
            settle: Duration::from_millis(self.settle_ms),
            wake: Duration::from_millis(self.wake_ms),
            retry: RetryController::new(
                RetryPolicy::new(
                    Duration::from_millis(self.inner_interval_ms),
                    self.inner_attempts,
                ),
                RetryPolicy::new(
                    Duration::from_millis(self.outer_interval_ms),
                    self.outer_attempts,
                ),
            ),
        }
    }
}

/// Get config directory (LIGHTGW_CONFIG_DIR, XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LIGHTGW_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/lightgw");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("lightgw");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/lightgw");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("lightgw");
        }
    }

    PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", i64::from(DEFAULT_PORT))?
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // LIGHTGW_PORT, LIGHTGW_SERIAL__PATH, LIGHTGW_TIMING__SETTLE_MS, ...
        .add_source(
            ::config::Environment::with_prefix("LIGHTGW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // HTTP port precedence: LIGHTGW_PORT > PORT > config file > default
    if let Ok(port) = std::env::var("LIGHTGW_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", i64::from(port_num))?;
        }
    } else if let Ok(port) = std::env::var("PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", i64::from(port_num))?;
        }
    }

    let config = builder.build()?;

    Ok(config.try_deserialize()?)
}
