//! Error types for plaintext-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for plaintext operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the plaintext responder
#[derive(Debug, Error)]
pub enum Error {
    /// Listen address could not be parsed or resolved
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// Listen socket could not be bound (address in use, permission, ...)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Parse error (profile, route, compression level)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response body could not be encoded
    #[error("Compression error: {0}")]
    Compression(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
