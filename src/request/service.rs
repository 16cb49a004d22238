//! Execution of decoded requests against local handlers or the collaborating service.

use std::backtrace::Backtrace;
use std::thread;
use std::time::Duration;

use crate::client::{HttpRequest, Method, Transport};
use crate::common::config::CoreCfg;
use crate::common::error::{CoreError, CoreResult};

use super::domain::{Request, TextResponse, MAX_SLEEP_MS};

/// Decode the raw payload and run it to completion on the calling thread.
pub fn handle(bytes: &[u8], cfg: &CoreCfg, transport: &dyn Transport) -> CoreResult<Vec<u8>> {
    let request = Request::decode(bytes)?;
    log::debug!(target: "bridge_core::request", "executing {}", request.op());
    execute(&request, cfg, transport)
}

/// Run a decoded request.
pub fn execute(request: &Request, cfg: &CoreCfg, transport: &dyn Transport) -> CoreResult<Vec<u8>> {
    match request {
        Request::Greeting { verb, name } => text(format!("{verb}, {name}!")),
        Request::Sleep { millis } => {
            let millis = (*millis).min(MAX_SLEEP_MS);
            thread::sleep(Duration::from_millis(millis));
            text(format!("awake after {millis} milliseconds"))
        }
        Request::Backtrace => text(Backtrace::force_capture().to_string()),
        Request::Fetch {
            endpoint,
            method,
            path,
            body,
        } => {
            let url = cfg.endpoint(*endpoint)?.join(path);
            let mut http = HttpRequest::new(*method, url);
            if let Some(body) = body {
                http = http.with_body(serde_json::to_vec(body)?);
            }
            transport.send(&http)
        }
        Request::Fund {
            endpoint,
            auth_key,
            amount,
        } => fund(cfg, transport, *endpoint, auth_key, *amount),
    }
}

fn text(text: String) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(&TextResponse { text })?)
}

/// Faucet mint; answers with the list of transaction hashes it produced.
fn fund(
    cfg: &CoreCfg,
    transport: &dyn Transport,
    endpoint: usize,
    auth_key: &str,
    amount: u64,
) -> CoreResult<Vec<u8>> {
    let url = cfg
        .endpoint(endpoint)?
        .join(&format!("/mint?amount={amount}&auth_key={auth_key}"));
    let raw = transport.send(&HttpRequest::new(Method::Post, url))?;

    let json: serde_json::Value = serde_json::from_slice(&raw)
        .map_err(|err| CoreError::protocol(format!("faucet answered with invalid json: {err}")))?;
    let hashes: Vec<String> = json
        .as_array()
        .ok_or_else(|| CoreError::protocol("faucet answer is not a list of transaction hashes"))?
        .iter()
        .map(|hash| match hash.as_str() {
            Some(s) => s.to_string(),
            None => hash.to_string(),
        })
        .collect();

    Ok(serde_json::to_vec(&hashes)?)
}
