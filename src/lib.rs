//! lightgw - HTTP to serial light gateway
//!
//! Translates HTTP requests into commands on a shared, line-oriented serial
//! link to addressable light nodes, and correlates the asynchronous lines the
//! nodes send back with the request that asked for them.
//!
//! This library provides:
//! - Command encoding for color, scene, on/off and status requests
//! - An inbound line queue with signature-based response matching
//! - A two-tier retry controller for status queries
//! - The gateway facade and its HTTP routes

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod link;
pub mod protocol;

pub use error::GatewayError;
pub use gateway::{Gateway, Reply, Timing};
