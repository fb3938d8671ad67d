//! Gateway errors.
//!
//! Dispatch-time errors become exactly one `(status, reason)` reply through
//! [`GatewayError::to_response`]; they are never propagated past the gateway.

use thiserror::Error;

use shared_types::{Response, StatusCode};

use super::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Command name is not `category.command` or names nothing registered.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Connection lacks the category's access.
    #[error("access denied to {command}: {reason}")]
    Forbidden {
        command: String,
        reason: &'static str,
    },

    #[error("message too large: {size} bytes exceeds {max}")]
    MessageTooLarge { size: usize, max: usize },

    /// Category queue is full.
    #[error("{category} queue is full")]
    Busy { category: String },

    /// Category worker has shut down.
    #[error("{category} workers are not running")]
    Closed { category: String },

    /// Registration named a category that was never declared.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("command registered twice: {0}")]
    DuplicateCommand(String),

    /// Building the gateway needs a running tokio runtime.
    #[error("gateway must be built inside a tokio runtime")]
    NoRuntime,

    #[error("invalid gateway configuration: {0}")]
    Config(#[from] ConfigError),
}

impl GatewayError {
    /// Reply for a rejected inbound request.
    pub fn to_response(&self) -> Response {
        let status = match self {
            GatewayError::UnknownCommand(_) => StatusCode::NOT_FOUND,
            GatewayError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GatewayError::MessageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Busy { .. } | GatewayError::Closed { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Response::new(status, self.to_string())
    }
}
