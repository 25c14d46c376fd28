//! Inbound response parsing
//!
//! Responses are recognised by a literal signature somewhere in the line.
//! The registry keeps `(signature, parser)` pairs in priority order so a line
//! carrying two signatures is always classified the same way.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{GatewayError, Result};

/// Preamble of a node status report
pub const STATUS_SIGNATURE: &str = "AASER/1.0 200 STATUS";

/// Parsed status report from a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub sender: String,
    pub device_type: String,
    pub values: HashMap<String, String>,
}

/// Parses the text following a signature (separator included)
pub type ResponseParser = fn(&str) -> Result<StatusResponse>;

#[derive(Debug, Clone)]
struct ResponseHandler {
    signature: String,
    parser: ResponseParser,
}

/// Ordered, immutable list of response handlers
#[derive(Debug, Clone)]
pub struct ResponseRegistry {
    handlers: Vec<ResponseHandler>,
}

impl ResponseRegistry {
    pub fn builder() -> ResponseRegistryBuilder {
        ResponseRegistryBuilder::default()
    }

    /// Signature this line belongs to: the first registered one it contains.
    pub fn classify(&self, line: &str) -> Option<&str> {
        self.handlers
            .iter()
            .find(|h| line.contains(h.signature.as_str()))
            .map(|h| h.signature.as_str())
    }

    /// Parse `line` with the parser registered for `signature`.
    ///
    /// Returns `None` if no parser is registered for `signature` or the line
    /// does not contain it.
    pub fn parse(&self, signature: &str, line: &str) -> Option<Result<StatusResponse>> {
        let handler = self.handlers.iter().find(|h| h.signature == signature)?;
        let start = line.find(signature)? + signature.len();
        Some((handler.parser)(&line[start..]))
    }
}

impl Default for ResponseRegistry {
    fn default() -> Self {
        Self::builder().register(STATUS_SIGNATURE, parse_status).build()
    }
}

#[derive(Debug, Default)]
pub struct ResponseRegistryBuilder {
    handlers: Vec<ResponseHandler>,
}

impl ResponseRegistryBuilder {
    /// Append a handler. Earlier registrations win ties.
    pub fn register(mut self, signature: impl Into<String>, parser: ResponseParser) -> Self {
        self.handlers.push(ResponseHandler {
            signature: signature.into(),
            parser,
        });
        self
    }

    pub fn build(self) -> ResponseRegistry {
        ResponseRegistry {
            handlers: self.handlers,
        }
    }
}

/// Parse a status report body: `<sep>sender devtype k1=v1,k2=v2,...`
pub fn parse_status(body: &str) -> Result<StatusResponse> {
    // skip the single separator that follows the signature
    let mut chars = body.chars();
    chars.next();
    let tokens: Vec<&str> = chars.as_str().split_whitespace().collect();

    let [sender, device_type, pairs, ..] = tokens.as_slice() else {
        return Err(GatewayError::MalformedResponse(format!(
            "expected at least 3 fields, got {}",
            tokens.len()
        )));
    };

    let mut values = HashMap::new();
    for pair in pairs.split(',') {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            GatewayError::MalformedResponse(format!("status field without '=': {:?}", pair))
        })?;
        if key.is_empty() {
            return Err(GatewayError::MalformedResponse(format!(
                "status field with empty key: {:?}",
                pair
            )));
        }
        if values.insert(key.to_string(), value.to_string()).is_some() {
            return Err(GatewayError::MalformedResponse(format!(
                "duplicate status key: {}",
                key
            )));
        }
    }

    Ok(StatusResponse {
        sender: sender.to_string(),
        device_type: device_type.to_string(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_body() {
        let registry = ResponseRegistry::default();
        let line = "AASER/1.0 200 STATUS X1 T2 a=1,b=2";
        let status = registry.parse(STATUS_SIGNATURE, line).unwrap().unwrap();

        assert_eq!(status.sender, "X1");
        assert_eq!(status.device_type, "T2");
        assert_eq!(status.values.len(), 2);
        assert_eq!(status.values["a"], "1");
        assert_eq!(status.values["b"], "2");
    }

    #[test]
    fn signature_may_follow_a_prefix() {
        let registry = ResponseRegistry::default();
        let line = "OK 3 AASER/1.0 200 STATUS 17 rgbled level=100,scene=4";
        let status = registry.parse(STATUS_SIGNATURE, line).unwrap().unwrap();
        assert_eq!(status.sender, "17");
        assert_eq!(status.values["scene"], "4");
    }

    #[test]
    fn values_may_be_empty() {
        let status = parse_status(" X1 T2 a=,b=2").unwrap();
        assert_eq!(status.values["a"], "");
    }

    #[test]
    fn malformed_bodies_are_errors() {
        for body in [" X1 T2 a=1,b", " X1 T2", "", " X1 T2 =1", " X1 T2 a=1,a=2"] {
            assert!(
                matches!(parse_status(body), Err(GatewayError::MalformedResponse(_))),
                "{body:?} should be malformed"
            );
        }
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let status = parse_status(" X1 T2 a=1 trailing junk").unwrap();
        assert_eq!(status.values.len(), 1);
    }

    #[test]
    fn classify_prefers_earlier_registration() {
        let registry = ResponseRegistry::builder()
            .register("STATUS", parse_status)
            .register(STATUS_SIGNATURE, parse_status)
            .build();
        assert_eq!(
            registry.classify("AASER/1.0 200 STATUS X1 T2 a=1"),
            Some("STATUS")
        );
        assert_eq!(registry.classify("noise"), None);
    }

    #[test]
    fn parse_unknown_signature_is_none() {
        let registry = ResponseRegistry::default();
        assert!(registry.parse("AASER/1.0 404", "AASER/1.0 404 X").is_none());
        assert!(registry.parse(STATUS_SIGNATURE, "noise").is_none());
    }
}
