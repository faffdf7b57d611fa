//! HTTP Request types

use http::{header, HeaderName, Method};
use smallvec::SmallVec;

/// HTTP Request
///
/// Only the request head is kept; request bodies are never read.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Request headers the handler stack reads
    pub headers: SmallVec<[(String, String); 4]>,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: SmallVec::new(),
        }
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get accept-encoding header
    pub fn accept_encoding(&self) -> Option<&str> {
        self.header("accept-encoding")
    }
}

/// Request headers copied out of hyper; nothing downstream reads any other
const CONSUMED_HEADERS: [HeaderName; 1] = [header::ACCEPT_ENCODING];

/// Convert the head of a hyper request to our Request type
///
/// Only `CONSUMED_HEADERS` are copied. Values that are not visible ASCII
/// are skipped.
pub fn from_hyper_request<B>(req: &hyper::Request<B>) -> Request {
    let mut request = Request::new(req.method().clone(), req.uri().path());

    for name in &CONSUMED_HEADERS {
        for value in req.headers().get_all(name) {
            if let Ok(v) = value.to_str() {
                request.headers.push((name.as_str().to_string(), v.to_string()));
            }
        }
    }

    request
}

/// Builder for constructing requests
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Create a new builder
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request: Request::new(method, path),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}
