//! Non-blocking call path: the request runs on the handle's worker pool and
//! the result is delivered through the host callback, exactly once.

use std::cell::Cell;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::api::types::Callback;
use crate::common::buf::OwnedBuffer;
use crate::common::error::CoreError;
use crate::common::ids::CallId;
use crate::common::log::log_call;
use crate::common::time;
use crate::handle::Shared;

use super::callback::PendingCallback;
use super::workers::{Job, Pool};

thread_local! {
    /// Identity of the core whose job runs on this thread, 0 when none.
    static ACTIVE_CORE: Cell<usize> = const { Cell::new(0) };
}

fn core_key(shared: &Arc<Shared>) -> usize {
    Arc::as_ptr(shared) as usize
}

/// True when the current thread is running a callback job of `shared`.
pub(crate) fn running_inside(shared: &Arc<Shared>) -> bool {
    ACTIVE_CORE.with(|active| active.get() == core_key(shared))
}

struct ActiveScope {
    previous: usize,
}

impl ActiveScope {
    fn enter(shared: &Arc<Shared>) -> Self {
        let previous = ACTIVE_CORE.with(|active| active.replace(core_key(shared)));
        Self { previous }
    }
}

impl Drop for ActiveScope {
    fn drop(&mut self) {
        ACTIVE_CORE.with(|active| active.set(self.previous));
    }
}

/// Queue `input` on `pool`; `callback` fires once the request has completed.
pub(crate) fn dispatch(shared: &Arc<Shared>, pool: &Pool, input: Vec<u8>, callback: Callback) {
    let id = CallId::next();
    let pending = PendingCallback::new(callback, id);

    let Some(slot) = shared.inflight.begin() else {
        deliver_detached(pending, CoreError::internal("core is shutting down"));
        return;
    };
    let pending = pending.holding(slot);

    let job_shared = Arc::clone(shared);
    let queued = Instant::now();
    let job: Job = Box::new(move || run(job_shared, input, pending, queued));

    if let Err(job) = pool.submit(job) {
        // Dropping the job fires its callback with an error; keep that off the caller's thread.
        let spawned = thread::Builder::new()
            .name("bridge-core-reject".into())
            .spawn(move || drop(job));
        if let Err(err) = spawned {
            log::error!(target: "bridge_core::dispatch", "call={id} rejected inline: {err}");
        }
    }
}

fn run(shared: Arc<Shared>, input: Vec<u8>, pending: PendingCallback, queued: Instant) {
    let _scope = ActiveScope::enter(&shared);
    let id = pending.id();
    log::debug!(
        target: "bridge_core::dispatch",
        "call={id} async on {:?}",
        thread::current().name()
    );

    let outcome = super::guarded(&shared, &input);
    let code = super::outcome_code(&outcome);
    pending.complete(OwnedBuffer::from_result(outcome));
    log_call("async", id, code, time::elapsed_ms(queued));
}

/// Answer `callback` with `err` without touching any handle state.
pub(crate) fn refuse(callback: Callback, err: CoreError) {
    deliver_detached(PendingCallback::new(callback, CallId::next()), err);
}

/// Fire `pending` with `err` from a fresh native thread, or inline when none can be spawned.
fn deliver_detached(pending: PendingCallback, err: CoreError) {
    let id = pending.id();
    log::warn!(target: "bridge_core::dispatch", "call={id} refused: {err}");
    let spawned = thread::Builder::new()
        .name("bridge-core-refuse".into())
        .spawn(move || pending.complete(OwnedBuffer::error(&err)));
    if let Err(spawn_err) = spawned {
        log::error!(target: "bridge_core::dispatch", "call={id} refused inline: {spawn_err}");
    }
}
