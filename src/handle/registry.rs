//! Addresses of handles currently owned by the host.
//!
//! Lets the boundary tell a live handle from a stale or foreign pointer
//! before dereferencing it.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::Core;

static LIVE: Lazy<Mutex<HashSet<usize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

pub fn register(core: *const Core) {
    LIVE.lock().insert(core as usize);
}

pub fn is_live(core: *const Core) -> bool {
    LIVE.lock().contains(&(core as usize))
}

/// Forget `core`; false when it was not registered.
pub fn release(core: *const Core) -> bool {
    LIVE.lock().remove(&(core as usize))
}
