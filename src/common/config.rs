//! Runtime configuration for a core handle.
//!
//! Endpoints come from the host at creation time. Everything else is an
//! internal default read from the process environment.

use std::env;
use std::time::Duration;

use log::LevelFilter;

use super::error::{CoreError, CoreResult};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_WORKERS: usize = 4;

/// Validated base URL of a collaborating service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    base: String,
}

impl Endpoint {
    /// Validate and normalise a base URL (`http(s)://host[...]`, trailing `/` trimmed).
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| CoreError::config(format!("endpoint {raw:?} must use http or https")))?;

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(CoreError::config(format!("endpoint {raw:?} has no valid host")));
        }
        // Request paths are appended to the base, so it cannot end in a query or fragment.
        if rest.contains(['?', '#']) {
            return Err(CoreError::config(format!(
                "endpoint {raw:?} must not carry a query or fragment"
            )));
        }

        Ok(Self {
            base: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Join a request path (which must start with `/`) onto the base URL.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Snapshot of configuration values consumed by one core handle.
#[derive(Clone, Debug)]
pub struct CoreCfg {
    pub endpoints: Vec<Endpoint>,
    pub timeout: Duration,
    pub workers: usize,
    pub log_level: LevelFilter,
}

impl CoreCfg {
    /// Build a configuration from host supplied URLs plus environment defaults.
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> CoreResult<Self> {
        if urls.is_empty() {
            return Err(CoreError::config("at least one endpoint url is required"));
        }

        let endpoints = urls
            .iter()
            .map(|url| Endpoint::parse(url.as_ref()))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self::with_endpoints(endpoints))
    }

    fn with_endpoints(endpoints: Vec<Endpoint>) -> Self {
        fn env_or(key: &str, default: &str) -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        }

        let timeout_ms = env_or("BRIDGE_TIMEOUT_MS", "")
            .parse::<u64>()
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let workers = env_or("BRIDGE_WORKERS", "")
            .parse::<usize>()
            .unwrap_or(DEFAULT_WORKERS)
            .max(1);
        let log_level = env_or("BRIDGE_LOG_LEVEL", "info")
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::Info);

        Self {
            endpoints,
            timeout: Duration::from_millis(timeout_ms),
            workers,
            log_level,
        }
    }

    /// Look up an endpoint by its position in the creation list.
    pub fn endpoint(&self, index: usize) -> CoreResult<&Endpoint> {
        self.endpoints.get(index).ok_or_else(|| {
            CoreError::protocol(format!(
                "endpoint index {index} out of range ({} configured)",
                self.endpoints.len()
            ))
        })
    }
}
