//! Lightweight logging backend emitting JSON lines on stderr.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

use super::error::ErrorCode;
use super::ids::CallId;

static LOGGER: OnceCell<JsonLogger> = OnceCell::new();

/// `log` backend writing one JSON object per record.
pub struct JsonLogger {
    level: LevelFilter,
}

impl JsonLogger {
    /// Render a record as a single JSON line (without the trailing newline).
    pub fn render(record: &Record) -> String {
        serde_json::json!({
            "ts": crate::common::time::now_ms() as u64,
            "level": record.level().as_str(),
            "target": record.target(),
            "msg": record.args().to_string(),
        })
        .to_string()
    }
}

impl Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::render(record);
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the JSON logger once per process.
///
/// Later calls are no-ops, as is the case where the host (or a test harness)
/// already installed another `log` backend.
pub fn init(level: LevelFilter) {
    let logger = LOGGER.get_or_init(|| JsonLogger { level });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

/// Emit the completion record of a boundary call.
pub fn log_call(path: &str, id: CallId, code: ErrorCode, dur_ms: u128) {
    if code == ErrorCode::Ok {
        log::info!(target: "bridge_core::call", "path={path} call={id} code=0 dur_ms={dur_ms}");
    } else {
        log::warn!(
            target: "bridge_core::call",
            "path={path} call={id} code={} dur_ms={dur_ms}",
            code as u32
        );
    }
}
