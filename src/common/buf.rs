//! Owned result buffers handed to the host.
//!
//! An [`OwnedBuffer`] is the only way the core produces memory for the host.
//! It is move-only; turning it into raw parts registers the allocation so
//! that a foreign free of unknown or already released memory is detected
//! instead of corrupting the heap.

use std::collections::HashSet;
use std::ffi::{c_char, CString};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::error::{CoreError, CoreResult};

static LIVE: Lazy<Mutex<HashSet<usize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Outcome of a call: response bytes or an error message.
#[derive(Debug, PartialEq, Eq)]
pub enum OwnedBuffer {
    Data(Vec<u8>),
    Error(CString),
}

/// Flat view of an [`OwnedBuffer`] that has left Rust ownership.
#[derive(Copy, Clone, Debug)]
pub struct RawParts {
    pub ptr: *const u8,
    pub len: usize,
    pub cap: usize,
    pub err: *const c_char,
}

/// Reason a set of raw parts could not be taken back.
#[derive(Debug, Eq, PartialEq)]
pub enum Reclaim {
    /// The allocation was never handed out or was already released.
    Unknown(usize),
}

impl OwnedBuffer {
    pub fn data(bytes: Vec<u8>) -> Self {
        Self::Data(bytes)
    }

    /// Build an error buffer; interior NUL bytes are escaped.
    pub fn error(err: &CoreError) -> Self {
        let text = err.to_string().replace('\0', "\\0");
        // No NUL bytes remain after the replacement above.
        Self::Error(CString::new(text).unwrap_or_default())
    }

    pub fn from_result(result: CoreResult<Vec<u8>>) -> Self {
        match result {
            Ok(bytes) => Self::data(bytes),
            Err(err) => Self::error(&err),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Data(bytes) => Some(bytes),
            Self::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Data(_) => None,
            Self::Error(msg) => msg.to_str().ok(),
        }
    }

    /// Give up ownership; the parts must come back through [`OwnedBuffer::from_raw`].
    pub fn into_raw(self) -> RawParts {
        match self {
            Self::Data(bytes) => {
                let mut bytes = std::mem::ManuallyDrop::new(bytes);
                let parts = RawParts {
                    ptr: bytes.as_mut_ptr(),
                    len: bytes.len(),
                    cap: bytes.capacity(),
                    err: std::ptr::null(),
                };
                if parts.cap > 0 {
                    LIVE.lock().insert(parts.ptr as usize);
                }
                parts
            }
            Self::Error(msg) => {
                let err = msg.into_raw() as *const c_char;
                LIVE.lock().insert(err as usize);
                RawParts {
                    ptr: std::ptr::null(),
                    len: 0,
                    cap: 0,
                    err,
                }
            }
        }
    }

    /// Take back ownership of parts produced by [`OwnedBuffer::into_raw`].
    ///
    /// # Safety
    ///
    /// When the allocation is still registered, the parts must be exactly
    /// the ones returned by `into_raw`. Unregistered parts are rejected
    /// without being touched.
    pub unsafe fn from_raw(parts: RawParts) -> Result<Self, Reclaim> {
        if !parts.err.is_null() {
            if !LIVE.lock().remove(&(parts.err as usize)) {
                return Err(Reclaim::Unknown(parts.err as usize));
            }
            let msg = CString::from_raw(parts.err as *mut c_char);
            return Ok(Self::Error(msg));
        }

        if parts.cap == 0 {
            // Nothing was allocated for an empty payload.
            return Ok(Self::Data(Vec::new()));
        }

        if parts.ptr.is_null() || !LIVE.lock().remove(&(parts.ptr as usize)) {
            return Err(Reclaim::Unknown(parts.ptr as usize));
        }
        Ok(Self::Data(Vec::from_raw_parts(
            parts.ptr as *mut u8,
            parts.len,
            parts.cap,
        )))
    }
}
