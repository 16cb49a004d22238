//! Shared utilities that glue the boundary, dispatch and client layers together.
pub mod buf;
pub mod config;
pub mod error;
pub mod ids;
pub mod log;
pub mod time;

pub use buf::OwnedBuffer;
pub use error::{CoreError, CoreResult, ErrorCode};
