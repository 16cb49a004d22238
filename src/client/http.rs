//! Blocking HTTP transport backed by a shared `ureq` agent.

use std::io::Read;
use std::time::Duration;

use crate::common::error::{CoreError, CoreResult};

use super::domain::{HttpRequest, Transport};

/// Upper bound on response bodies accepted from the service.
const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Connection pool shared by all calls on a core handle.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> CoreResult<Vec<u8>> {
        log::debug!(target: "bridge_core::client", "{} {}", request.method.as_str(), request.url);

        let pending = self
            .agent
            .request(request.method.as_str(), &request.url)
            .set("content-type", "application/json");

        let outcome = match &request.body {
            Some(body) => pending.send_bytes(body),
            None => pending.call(),
        };

        match outcome {
            Ok(response) => read_body(response),
            Err(ureq::Error::Status(status, response)) => {
                let body = read_body(response).unwrap_or_default();
                Err(CoreError::service(describe_status(status, &body)))
            }
            Err(ureq::Error::Transport(transport)) => {
                log::error!(target: "bridge_core::client", "{}: {}", request.url, transport);
                Err(CoreError::transport(transport.to_string()))
            }
        }
    }
}

fn read_body(response: ureq::Response) -> CoreResult<Vec<u8>> {
    read_limited(response.into_reader(), MAX_BODY_BYTES)
}

/// Read at most `limit` bytes; a longer body is an error, never a truncated payload.
fn read_limited(reader: impl Read, limit: u64) -> CoreResult<Vec<u8>> {
    let mut body = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut body)
        .map_err(|err| CoreError::transport(format!("reading response body: {err}")))?;
    if body.len() as u64 > limit {
        return Err(CoreError::protocol(format!(
            "response body exceeds {limit} bytes"
        )));
    }
    Ok(body)
}

/// Build the message for a non-2xx answer, preferring the service's own `message`.
pub(crate) fn describe_status(status: u16, body: &[u8]) -> String {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["message"].as_str().map(str::to_string))
        .filter(|msg| !msg.is_empty());

    match message {
        Some(msg) => format!("status {status}: {msg}"),
        None => format!("status {status}"),
    }
}
