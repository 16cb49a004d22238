//! C-compatible API exposed to the host application.
//!
//! Ownership rules for every entrypoint:
//! - `bridge_core_create` returns a handle owned by the host, or null when
//!   the endpoint configuration is rejected;
//! - `bridge_core_destroy` consumes the handle and returns only once no
//!   callback of that handle can fire any more;
//! - input bytes are borrowed for the duration of the call and never retained;
//! - every returned or delivered [`ByteBuffer`] must go back through
//!   `bridge_free_data` exactly once.
//!
//! Freeing unknown memory or destroying an unknown handle aborts the process.

use std::ffi::{c_char, CStr};

use crate::common::buf::{OwnedBuffer, Reclaim};
use crate::common::error::{CoreError, CoreResult};
use crate::dispatch::background;
use crate::handle::{registry, Core};

use super::types::{ByteBuffer, Callback};

/// ABI version to coordinate with the host layer.
pub const API_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn bridge_api_version() -> u32 {
    API_VERSION
}

/// Create a core for `count` endpoint URLs (NUL terminated UTF-8).
///
/// # Safety
///
/// `urls` must point to `count` readable pointers, each null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn bridge_core_create(
    urls: *const *const c_char,
    count: usize,
) -> *mut Core {
    let created = read_urls(urls, count).and_then(|urls| Core::from_urls(&urls));
    match created {
        Ok(core) => {
            let raw = Box::into_raw(Box::new(core));
            registry::register(raw);
            raw
        }
        Err(err) => {
            log::error!(target: "bridge_core::api", "create rejected: {err}");
            std::ptr::null_mut()
        }
    }
}

unsafe fn read_urls(urls: *const *const c_char, count: usize) -> CoreResult<Vec<String>> {
    if urls.is_null() || count == 0 {
        return Err(CoreError::config("no endpoint urls given"));
    }
    std::slice::from_raw_parts(urls, count)
        .iter()
        .enumerate()
        .map(|(idx, &url)| {
            if url.is_null() {
                return Err(CoreError::config(format!("endpoint url #{idx} is null")));
            }
            CStr::from_ptr(url)
                .to_str()
                .map(str::to_string)
                .map_err(|_| CoreError::config(format!("endpoint url #{idx} is not utf-8")))
        })
        .collect()
}

/// Destroy a core; null is a no-op.
///
/// # Safety
///
/// `core` must be null or a handle from `bridge_core_create` not destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn bridge_core_destroy(core: *mut Core) {
    if core.is_null() {
        return;
    }
    if !registry::release(core) {
        log::error!(target: "bridge_core::api", "destroy of unknown core {core:p}");
        std::process::abort();
    }
    drop(Box::from_raw(core));
}

/// Run a request on the calling thread.
///
/// # Safety
///
/// `core` must be a live handle; `data` must point to `len` readable bytes
/// (it may be null when `len` is 0).
#[no_mangle]
pub unsafe extern "C" fn bridge_call(core: *mut Core, data: *const u8, len: usize) -> ByteBuffer {
    let outcome = match (live_core(core), input_slice(data, len)) {
        (Ok(core), Ok(input)) => core.call(input),
        (Err(err), _) | (_, Err(err)) => OwnedBuffer::error(&err),
    };
    ByteBuffer::from(outcome)
}

/// Queue a request; `callback` fires exactly once from a native worker thread.
///
/// A refused call (unknown handle, null input, core shutting down) fires from
/// a freshly spawned thread instead. When no thread can be spawned it fires
/// on the calling thread before this function returns.
///
/// # Safety
///
/// Same contract as [`bridge_call`]; `callback.callback` must stay callable
/// until it has fired.
#[no_mangle]
pub unsafe extern "C" fn bridge_call_async(
    core: *mut Core,
    data: *const u8,
    len: usize,
    callback: Callback,
) {
    if callback.callback.is_none() {
        log::error!(target: "bridge_core::api", "async call without callback dropped");
        return;
    }

    let queued = live_core(core).and_then(|core| Ok((core, input_slice(data, len)?)));
    match queued {
        Ok((core, input)) => core.call_async(input.to_vec(), callback),
        Err(err) => background::refuse(callback, err),
    }
}

/// Release a buffer returned by [`bridge_call`] or delivered to a callback.
///
/// # Safety
///
/// `data` must be passed unmodified and exactly once.
#[no_mangle]
pub unsafe extern "C" fn bridge_free_data(data: ByteBuffer) {
    match data.reclaim() {
        Ok(buffer) => drop(buffer),
        Err(Reclaim::Unknown(addr)) => {
            log::error!(target: "bridge_core::api", "free of unknown buffer {addr:#x}");
            std::process::abort();
        }
    }
}

unsafe fn live_core<'a>(core: *mut Core) -> CoreResult<&'a Core> {
    if core.is_null() || !registry::is_live(core) {
        return Err(CoreError::config("unknown or destroyed core handle"));
    }
    Ok(&*core)
}

unsafe fn input_slice<'a>(data: *const u8, len: usize) -> CoreResult<&'a [u8]> {
    match (data.is_null(), len) {
        (_, 0) => Ok(&[]),
        (true, _) => Err(CoreError::protocol("null input with non-zero length")),
        (false, len) => Ok(std::slice::from_raw_parts(data, len)),
    }
}
