//! Request domain: envelope decoding and execution.

pub mod domain;
pub mod service;

pub use domain::{Request, TextResponse};
