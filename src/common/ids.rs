//! Identifiers used to correlate log lines of a single call.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CALL: AtomicU64 = AtomicU64::new(1);

/// Process-unique, monotonically increasing call identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

impl CallId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        Self(NEXT_CALL.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
