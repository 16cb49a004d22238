//! Exactly-once delivery of asynchronous results.

use crate::api::types::Callback;
use crate::common::buf::OwnedBuffer;
use crate::common::error::CoreError;
use crate::common::ids::CallId;
use crate::handle::inflight::InFlightGuard;

/// Owns a host callback until it has been fired.
///
/// [`PendingCallback::complete`] consumes the guard. If the guard is dropped
/// without completing (the job was lost, or unwound), it still delivers an
/// internal error so the host always hears back once. The in-flight slot it
/// holds is released only after the callback returned.
pub struct PendingCallback {
    target: Option<Callback>,
    id: CallId,
    _slot: Option<InFlightGuard>,
}

impl PendingCallback {
    pub fn new(target: Callback, id: CallId) -> Self {
        Self {
            target: Some(target),
            id,
            _slot: None,
        }
    }

    /// Keep `slot` occupied until the callback has fired.
    pub fn holding(mut self, slot: InFlightGuard) -> Self {
        self._slot = Some(slot);
        self
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn complete(mut self, outcome: OwnedBuffer) {
        if let Some(target) = self.target.take() {
            target.invoke(outcome);
        }
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            log::error!(
                target: "bridge_core::dispatch",
                "call={} dropped before completion",
                self.id
            );
            let err = CoreError::internal("call dropped before completion");
            target.invoke(OwnedBuffer::error(&err));
        }
    }
}
