//! plaintext-core: fixed-response HTTP/1.1 benchmark target
//!
//! Answers one configured path with `Hello, World!\r\n` and a fixed set of
//! headers, as fast as hyper and tokio allow.
//!
//! ## Features
//! - `compress` - Gzip response compression (on by default; still gated at
//!   runtime by [`ListenConfig::compression`])

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

// Re-exports
pub use config::{ListenConfig, Profile};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerExt, Plaintext};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};

// Middleware re-exports
pub use middleware::{Compress, CompressionLevel, Encoding, Middleware, Wrapped};

pub use server::{build_handler, create_optimized_socket, serve, Server};
