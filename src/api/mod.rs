//! Public entry points for foreign function interfaces.

pub mod ffi;
pub mod types;

pub use types::{ByteBuffer, Callback, CallbackFn};
