//! Synchronous and asynchronous execution paths behind the boundary.

pub mod background;
pub mod callback;
pub mod sync;
pub mod workers;

use std::panic::{self, AssertUnwindSafe};

use crate::common::error::{CoreError, CoreResult, ErrorCode};
use crate::handle::Shared;
use crate::request::service;

/// Run one request, converting a panic anywhere below into an internal error.
pub(crate) fn guarded(shared: &Shared, input: &[u8]) -> CoreResult<Vec<u8>> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        service::handle(input, &shared.cfg, shared.transport.as_ref())
    }))
    .unwrap_or_else(|payload| Err(CoreError::from_panic(payload.as_ref())))
}

pub(crate) fn outcome_code(outcome: &CoreResult<Vec<u8>>) -> ErrorCode {
    match outcome {
        Ok(_) => ErrorCode::Ok,
        Err(err) => err.code(),
    }
}
