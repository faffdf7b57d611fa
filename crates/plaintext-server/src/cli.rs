//! Command-line flags

use clap::Parser;
use plaintext_core::{CompressionLevel, ListenConfig, Profile};

#[derive(Debug, Parser)]
#[command(name = "plaintext-server")]
#[command(about = "Fixed-response HTTP/1.1 benchmark target", long_about = None)]
pub struct Cli {
    /// Deployment profile: `plaintext` (:8080, /plaintext) or `foo-bar` (:8542, /foo/bar)
    #[arg(long, env = "PLAINTEXT_PROFILE", default_value = "plaintext")]
    pub profile: Profile,

    /// TCP address to listen to (`host:port` or `:port`), defaults to the profile's
    #[arg(short, long, env = "PLAINTEXT_ADDR")]
    pub addr: Option<String>,

    /// Path to answer on, defaults to the profile's
    #[arg(short, long, env = "PLAINTEXT_ROUTE")]
    pub route: Option<String>,

    /// Gzip responses for clients that accept it
    #[arg(long, env = "PLAINTEXT_COMPRESS")]
    pub compress: bool,

    /// Gzip level: fast, default or best
    #[arg(long, env = "PLAINTEXT_COMPRESSION_LEVEL", default_value = "default")]
    pub compression_level: CompressionLevel,

    /// Runtime worker threads, defaults to the number of CPUs
    #[arg(short, long, env = "PLAINTEXT_WORKERS")]
    pub workers: Option<usize>,

    /// Listen backlog
    #[arg(long, env = "PLAINTEXT_BACKLOG", default_value_t = 1024)]
    pub backlog: u32,

    /// Set SO_REUSEPORT so several processes can share the port
    #[arg(long, env = "PLAINTEXT_REUSE_PORT")]
    pub reuse_port: bool,

    /// Leave Nagle's algorithm on for accepted connections
    #[arg(long, env = "PLAINTEXT_NO_NODELAY")]
    pub no_nodelay: bool,

    /// Close each connection after one response
    #[arg(long, env = "PLAINTEXT_NO_KEEP_ALIVE")]
    pub no_keep_alive: bool,
}

impl Cli {
    /// Listener configuration: profile defaults overridden by flags
    pub fn listen_config(&self) -> ListenConfig {
        let mut config = ListenConfig::for_profile(self.profile)
            .compression(self.compress)
            .compression_level(self.compression_level)
            .backlog(self.backlog)
            .reuse_port(self.reuse_port)
            .nodelay(!self.no_nodelay)
            .keep_alive(!self.no_keep_alive);
        if let Some(addr) = &self.addr {
            config = config.bind_address(addr.as_str());
        }
        if let Some(route) = &self.route {
            config = config.route(route.as_str());
        }
        config
    }

    pub fn worker_threads(&self) -> usize {
        self.workers.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["plaintext-server"]).unwrap();
        let config = cli.listen_config();
        assert_eq!(config.bind_address, ":8080");
        assert_eq!(config.route, "/plaintext");
        assert!(!config.compression);
        assert_eq!(config.backlog, 1024);
        assert!(!config.reuse_port);
        assert!(config.nodelay);
        assert!(config.keep_alive);
        assert!(cli.worker_threads() >= 1);
    }

    #[test]
    fn test_foo_bar_with_compression() {
        let cli = Cli::try_parse_from([
            "plaintext-server",
            "--profile",
            "foo-bar",
            "--compress",
            "--compression-level",
            "best",
        ])
        .unwrap();
        let config = cli.listen_config();
        assert_eq!(config.bind_address, ":8542");
        assert_eq!(config.route, "/foo/bar");
        assert!(config.compression);
        assert_eq!(config.compression_level, CompressionLevel::Best);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "plaintext-server",
            "--addr",
            "127.0.0.1:9000",
            "--route",
            "/bench",
            "--workers",
            "2",
        ])
        .unwrap();
        let config = cli.listen_config();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.route, "/bench");
        assert_eq!(cli.worker_threads(), 2);
    }

    #[test]
    fn test_socket_flags() {
        let cli = Cli::try_parse_from([
            "plaintext-server",
            "--reuse-port",
            "--no-nodelay",
            "--no-keep-alive",
        ])
        .unwrap();
        let config = cli.listen_config();
        assert!(config.reuse_port);
        assert!(!config.nodelay);
        assert!(!config.keep_alive);
    }

    #[test]
    fn test_rejects_unknown_profile() {
        assert!(Cli::try_parse_from(["plaintext-server", "--profile", "json"]).is_err());
    }
}
