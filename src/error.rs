//! Error types shared by the remote client, the mirror and the bridge engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Network failure or non-2xx response from SuperConductor
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response parsed but did not have the expected shape
    #[error("unexpected response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// A command or feedback was invoked without a group selected
    #[error("no group selected")]
    MissingSelector,

    /// A rundown or group id cannot be turned into a composed identifier
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },
}

impl BridgeError {
    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        BridgeError::Transport {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(endpoint: &str, message: impl Into<String>) -> Self {
        BridgeError::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_identifier(value: &str, reason: &str) -> Self {
        BridgeError::InvalidIdentifier {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the host should be told that connectivity is degraded
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BridgeError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
