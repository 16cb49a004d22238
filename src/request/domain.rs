//! Request envelope decoded from the bytes the host hands in.
//!
//! The boundary has a single call entrypoint per path; the operation is
//! selected by the `op` tag of the JSON payload.

use serde::{Deserialize, Serialize};

use crate::client::Method;
use crate::common::error::{CoreError, CoreResult};

/// Longest sleep a request may ask for.
pub const MAX_SLEEP_MS: u64 = 60_000;

/// Operations understood by the core.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Answered locally: `"{verb}, {name}!"`.
    Greeting { verb: String, name: String },
    /// Answered locally after blocking the executing thread.
    Sleep { millis: u64 },
    /// Answered locally with the stack of the executing thread.
    Backtrace,
    /// Forwarded verbatim to a configured endpoint.
    Fetch {
        #[serde(default)]
        endpoint: usize,
        #[serde(default)]
        method: Method,
        path: String,
        #[serde(default)]
        body: Option<serde_json::Value>,
    },
    /// Faucet mint into the account identified by `auth_key`.
    Fund {
        #[serde(default)]
        endpoint: usize,
        auth_key: String,
        amount: u64,
    },
}

/// Text response of the locally answered operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

impl Request {
    /// Decode and validate the raw payload.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.is_empty() {
            return Err(CoreError::protocol("empty request payload"));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|err| CoreError::protocol(format!("request is not utf-8: {err}")))?;
        let request: Request = serde_json::from_str(text)
            .map_err(|err| CoreError::protocol(format!("invalid request: {err}")))?;
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> CoreResult<()> {
        match self {
            Self::Fetch { path, .. } if !path.starts_with('/') => Err(CoreError::protocol(
                format!("fetch path {path:?} must start with '/'"),
            )),
            Self::Fund { auth_key, .. }
                if auth_key.is_empty() || !auth_key.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Err(CoreError::protocol("fund auth_key must be non-empty and alphanumeric"))
            }
            _ => Ok(()),
        }
    }

    /// Short name used in log lines.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Greeting { .. } => "greeting",
            Self::Sleep { .. } => "sleep",
            Self::Backtrace => "backtrace",
            Self::Fetch { .. } => "fetch",
            Self::Fund { .. } => "fund",
        }
    }
}
