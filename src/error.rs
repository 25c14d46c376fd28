//! Gateway error taxonomy

use thiserror::Error;

use crate::link::transport::TransportError;
use crate::protocol::command::DeviceAddress;

/// Errors a gateway operation can end with.
///
/// None of these are fatal to the process: the HTTP layer turns every variant
/// into an error payload and the gateway keeps serving.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Requested scene name is not in the scene table. Nothing was written.
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// A candidate response line could not be parsed.
    ///
    /// The matcher swallows this (the line is dropped as a non-match); it only
    /// escapes from the parser functions themselves.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Both retry tiers ran out without a matching status line.
    #[error("no status response from device {address} after {sends} STATUS commands")]
    StatusTimeout { address: DeviceAddress, sends: u32 },

    /// The serial link failed mid-request. Only the current request is aborted.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
