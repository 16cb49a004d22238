//! Client side of the collaborating service: request shapes and transports.

pub mod domain;
pub mod http;

pub use domain::{HttpRequest, Method, Transport};
pub use http::UreqTransport;
