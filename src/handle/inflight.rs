//! Accounting of asynchronous calls that still owe the host a callback.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct State {
    count: usize,
    closed: bool,
}

/// Counter of outstanding asynchronous calls plus the closed flag set by destroy.
#[derive(Default)]
pub struct InFlight {
    state: Mutex<State>,
    idle: Condvar,
}

/// Held by one outstanding call; releasing it may wake a waiting destroy.
pub struct InFlightGuard {
    owner: Arc<InFlight>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new call, unless the owner is already closed.
    pub fn begin(self: &Arc<Self>) -> Option<InFlightGuard> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.count += 1;
        Some(InFlightGuard {
            owner: Arc::clone(self),
        })
    }

    /// Refuse new calls from now on.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Block until at most `own` calls remain outstanding.
    ///
    /// `own` is 1 when the caller is itself running inside an outstanding call.
    pub fn drain(&self, own: usize) {
        let mut state = self.state.lock();
        while state.count > own {
            self.idle.wait(&mut state);
        }
    }

    pub fn outstanding(&self) -> usize {
        self.state.lock().count
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.count -= 1;
        self.idle.notify_all();
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.finish();
    }
}
