//! Error types for request decoding and outcome delivery.
//!
//! Failures raised by host operations are deliberately absent from this
//! module: they never become Rust errors. The dispatchers catch them at the
//! boundary and report them to the caller as `Exception` outcomes. What
//! remains here are the failures of the bridge plumbing itself.

use thiserror::Error;

use crate::protocol::RequestId;

/// Errors surfaced while decoding an inbound request envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request line is empty or is not valid JSON.
    #[error("malformed request: {message}")]
    Malformed {
        /// Human-readable description of the parse failure.
        message: String,
        /// Underlying JSON error, when one was produced.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The JSON does not match the request envelope schema.
    #[error("invalid request structure: {message}")]
    InvalidStructure {
        /// Human-readable description of the schema mismatch.
        message: String,
    },

    /// The `__type` discriminator names no known request kind.
    #[error("unknown request kind '{kind}'")]
    UnknownKind {
        /// Request identifier, when it could be recovered from the envelope.
        id: Option<RequestId>,
        /// The unrecognised discriminator value.
        kind: String,
    },

    /// A symbolic path was constructed without any segments.
    #[error("symbolic path must contain at least one segment")]
    EmptyPath,
}

impl ProtocolError {
    /// Creates a malformed request error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid structure error.
    #[must_use]
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Creates an unknown kind error.
    #[must_use]
    pub fn unknown_kind(id: Option<RequestId>, kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            id,
            kind: kind.into(),
        }
    }
}

/// Errors raised by the bridge while delivering outcomes.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The consumer of the response channel has gone away.
    #[error("response channel closed; outcome for request '{id}' was dropped")]
    ChannelClosed {
        /// Request whose outcome could not be delivered.
        id: RequestId,
    },
}

impl BridgeError {
    /// Creates a channel closed error for the given request.
    #[must_use]
    pub fn channel_closed(id: &RequestId) -> Self {
        Self::ChannelClosed { id: id.clone() }
    }
}
