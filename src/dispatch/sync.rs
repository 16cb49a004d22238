//! Blocking call path: the request runs on the caller's thread.

use std::time::Instant;

use crate::common::buf::OwnedBuffer;
use crate::common::ids::CallId;
use crate::common::log::log_call;
use crate::common::time;
use crate::handle::Shared;

/// Execute `input` inline and return the owned result.
pub(crate) fn dispatch(shared: &Shared, input: &[u8]) -> OwnedBuffer {
    let id = CallId::next();
    let start = Instant::now();
    log::debug!(
        target: "bridge_core::dispatch",
        "call={id} sync on {:?}",
        std::thread::current().name()
    );

    let outcome = super::guarded(shared, input);
    log_call("sync", id, super::outcome_code(&outcome), time::elapsed_ms(start));

    OwnedBuffer::from_result(outcome)
}
