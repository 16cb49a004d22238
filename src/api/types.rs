//! Plain C layouts crossing the boundary.
//!
//! Ownership rules:
//! - every [`ByteBuffer`] produced by the core belongs to the host until it
//!   is passed to `bridge_free_data`, exactly once;
//! - `err` non-null means the call failed and `ptr`/`len`/`cap` carry no data;
//! - `err` null means `ptr` is non-null and `len <= cap`;
//! - a [`Callback`] context is never dereferenced by the core, only passed back.

use std::ffi::{c_char, c_void};

use crate::common::buf::{OwnedBuffer, RawParts, Reclaim};

/// Byte region allocated by the core plus an optional NUL terminated error.
#[repr(C)]
#[derive(Debug)]
pub struct ByteBuffer {
    pub ptr: *const u8,
    pub len: usize,
    pub cap: usize,
    pub err: *const c_char,
}

impl From<OwnedBuffer> for ByteBuffer {
    fn from(buffer: OwnedBuffer) -> Self {
        let RawParts { ptr, len, cap, err } = buffer.into_raw();
        Self { ptr, len, cap, err }
    }
}

impl ByteBuffer {
    /// Take the allocation back into Rust ownership.
    ///
    /// # Safety
    ///
    /// `self` must be a descriptor produced by this library, unmodified.
    pub unsafe fn reclaim(self) -> Result<OwnedBuffer, Reclaim> {
        OwnedBuffer::from_raw(RawParts {
            ptr: self.ptr,
            len: self.len,
            cap: self.cap,
            err: self.err,
        })
    }

    pub fn is_error(&self) -> bool {
        !self.err.is_null()
    }
}

/// Host function receiving the outcome of an asynchronous call.
pub type CallbackFn = extern "C" fn(context: *const c_void, result: ByteBuffer);

/// Host context paired with the function that receives the result.
#[repr(C)]
#[derive(Debug)]
pub struct Callback {
    pub context: *const c_void,
    pub callback: Option<CallbackFn>,
}

// The context is opaque to the core and only travels back to the host,
// which is responsible for any synchronisation it needs.
unsafe impl Send for Callback {}

impl Callback {
    /// Hand the outcome to the host; ownership of the buffer moves with it.
    pub fn invoke(self, outcome: OwnedBuffer) {
        match self.callback {
            Some(callback) => callback(self.context, ByteBuffer::from(outcome)),
            None => log::error!(target: "bridge_core::api", "callback without function pointer"),
        }
    }
}
