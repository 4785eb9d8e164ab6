use std::time::Duration;
use thiserror::Error;

/// Failure of a single-record KV operation or of a scanner fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-zero status code; render it with `KvClient::error_string`.
    #[error("request failed with status {0}")]
    Status(i32),

    #[error("client error: {0}")]
    Other(String),
}

impl ClientError {
    pub fn code(&self) -> Option<i32> {
        match self {
            ClientError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    #[error("{operation} failed: {reason}")]
    Request {
        operation: &'static str,
        reason: String,
    },

    #[error("meta server unreachable: {0}")]
    Unreachable(String),
}

impl MetaError {
    pub fn request(operation: &'static str, reason: impl Into<String>) -> Self {
        MetaError::Request {
            operation,
            reason: reason.into(),
        }
    }
}

/// Failure to deliver a remote command or receive its reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("rpc failed: {0}")]
    Rpc(String),
}
