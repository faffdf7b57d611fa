//! Middleware implementations
//!
//! A middleware sees the request before the handler and the response after
//! it. [`Wrapped`] composes one handler with one middleware into a new
//! handler.

pub mod compress;

pub use compress::{Compress, CompressionLevel, Encoding};

use crate::handler::Handler;
use crate::{Request, Response};

/// Middleware trait - process request/response
pub trait Middleware: Send + Sync {
    /// Process request before handler, return early response if any
    fn before(&self, _req: &Request) -> Option<Response> {
        None
    }

    /// Process response after handler
    fn after(&self, req: &Request, res: &mut Response);
}

/// A handler wrapped by a middleware
pub struct Wrapped<H, M> {
    inner: H,
    middleware: M,
}

impl<H, M> Wrapped<H, M> {
    pub fn new(inner: H, middleware: M) -> Self {
        Self { inner, middleware }
    }
}

impl<H: Handler, M: Middleware> Handler for Wrapped<H, M> {
    fn handle(&self, req: &Request) -> Response {
        if let Some(res) = self.middleware.before(req) {
            return res;
        }
        let mut res = self.inner.handle(req);
        self.middleware.after(req, &mut res);
        res
    }
}
