//! Request descriptions and the transport contract for the collaborating service.

use serde::Deserialize;

use crate::common::error::CoreResult;

/// HTTP method of a forwarded request.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Fully resolved request against one endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Contract for reaching the collaborating service.
///
/// Implementations are shared by every call on a handle, from any thread.
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response body of a 2xx answer.
    fn send(&self, request: &HttpRequest) -> CoreResult<Vec<u8>>;
}
