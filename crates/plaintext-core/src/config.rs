//! Listener configuration
//!
//! Built once at process start and never mutated afterwards. Two deployment
//! profiles exist: `plaintext` (`:8080`, `/plaintext`) and `foo-bar`
//! (`:8542`, `/foo/bar`).

use crate::middleware::CompressionLevel;
use crate::{Error, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// Deployment profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Plaintext,
    FooBar,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Plaintext => "plaintext",
            Profile::FooBar => "foo-bar",
        }
    }

    /// Default bind address for this profile
    pub fn bind_address(&self) -> &'static str {
        match self {
            Profile::Plaintext => ":8080",
            Profile::FooBar => ":8542",
        }
    }

    /// Route served by this profile
    pub fn route(&self) -> &'static str {
        match self {
            Profile::Plaintext => "/plaintext",
            Profile::FooBar => "/foo/bar",
        }
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plaintext" => Ok(Profile::Plaintext),
            "foo-bar" | "foobar" | "foo_bar" => Ok(Profile::FooBar),
            _ => Err(Error::Parse(format!("unknown profile: {}", s))),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// `host:port`, or `:port` for all IPv4 interfaces
    pub bind_address: String,
    /// The single path this instance answers on
    pub route: String,
    /// Enable transparent gzip compression
    pub compression: bool,
    pub compression_level: CompressionLevel,
    /// Listen backlog
    pub backlog: u32,
    /// SO_REUSEPORT on the listen socket (unix only). Off by default so a
    /// second listener on a taken port fails to bind.
    pub reuse_port: bool,
    /// TCP_NODELAY on accepted connections
    pub nodelay: bool,
    /// HTTP/1.1 persistent connections
    pub keep_alive: bool,
}

impl ListenConfig {
    /// Configuration with the defaults of a deployment profile
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            bind_address: profile.bind_address().to_string(),
            route: profile.route().to_string(),
            compression: false,
            compression_level: CompressionLevel::Default,
            backlog: 1024,
            reuse_port: false,
            nodelay: true,
            keep_alive: true,
        }
    }

    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = addr.into();
        self
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    pub fn backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn reuse_port(mut self, enabled: bool) -> Self {
        self.reuse_port = enabled;
        self
    }

    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = enabled;
        self
    }

    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// Resolve the bind address to a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = self.bind_address.trim();
        let normalized = match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => addr.to_string(),
        };

        if let Ok(parsed) = normalized.parse::<SocketAddr>() {
            return Ok(parsed);
        }

        normalized
            .to_socket_addrs()
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", self.bind_address, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(self.bind_address.clone()))
    }

    /// Check the configuration before binding
    pub fn validate(&self) -> Result<()> {
        if !self.route.starts_with('/') {
            return Err(Error::Parse(format!(
                "route must start with '/': {}",
                self.route
            )));
        }
        if self.backlog == 0 {
            return Err(Error::Parse("backlog must be greater than zero".to_string()));
        }
        Ok(())
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}
