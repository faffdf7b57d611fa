//! Request handlers
//!
//! A [`Handler`] turns a request head into a response without doing any I/O.
//! [`Plaintext`] is the fixed benchmark response; closures work too.

use crate::middleware::{Middleware, Wrapped};
use crate::{Request, Response, ResponseBuilder, StatusCode};
use bytes::Bytes;

/// Fixed response body
pub const BODY: &[u8] = b"Hello, World!\r\n";
pub const CONTENT_TYPE: &str = "text/plain; charset=UTF-8";
pub const SERVER: &str = "Example";
/// Literal timestamp; responses must not depend on the wall clock.
pub const DATE: &str = "Wed, 17 Apr 2013 12:00:00 GMT";

/// Handler trait - produce a response for a request
pub trait Handler: Send + Sync {
    fn handle(&self, req: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn handle(&self, req: &Request) -> Response {
        self(req)
    }
}

/// Composition helpers available on every handler
pub trait HandlerExt: Handler + Sized {
    /// Wrap this handler with a middleware
    fn wrap<M: Middleware>(self, middleware: M) -> Wrapped<Self, M> {
        Wrapped::new(self, middleware)
    }
}

impl<H: Handler> HandlerExt for H {}

/// The fixed plaintext response
///
/// Method, path and headers are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plaintext;

impl Handler for Plaintext {
    #[inline]
    fn handle(&self, _req: &Request) -> Response {
        ResponseBuilder::new(StatusCode::OK)
            .header("Content-Type", CONTENT_TYPE)
            .header("Server", SERVER)
            .header("Date", DATE)
            .body(Bytes::from_static(BODY))
            .build()
    }
}
