//! Native core exposed to a host application through a small C ABI.
//!
//! The host creates one [`Core`] per session, sends opaque request bytes
//! either synchronously or asynchronously with a callback, and frees every
//! returned [`ByteBuffer`] through `bridge_free_data`.
pub mod api;
pub mod client;
pub mod common;
pub mod dispatch;
pub mod handle;
pub mod request;

pub use api::ffi::{
    bridge_api_version, bridge_call, bridge_call_async, bridge_core_create, bridge_core_destroy,
    bridge_free_data,
};
pub use api::{ByteBuffer, Callback, CallbackFn};
pub use common::{CoreError, CoreResult, ErrorCode, OwnedBuffer};
pub use handle::Core;
