//! Error handling primitives shared across the core.
//!
//! Every recoverable failure ends up as the `err` text of a returned buffer,
//! so the `Display` output of [`CoreError`] is what the host reads.

use thiserror::Error;

/// Stable error codes used in logs and exposed to tests.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Endpoint configuration was rejected or the handle is unknown.
    Config = 1,
    /// The collaborating service could not be reached.
    Transport = 2,
    /// Input bytes (or a response) could not be decoded.
    Protocol = 3,
    /// The collaborating service answered with an error.
    Service = 4,
    /// Catch-all for bugs, panics and shutdown races.
    Internal = 5,
}

/// Canonical error type for the core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Build an internal error from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Internal(format!("call panicked: {detail}"))
    }

    /// Machine readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::Config,
            Self::Transport(_) => ErrorCode::Transport,
            Self::Protocol(_) => ErrorCode::Protocol,
            Self::Service(_) => ErrorCode::Service,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
