//! Server configuration
//!
//! Every setting can come from a command-line flag or an environment
//! variable; flags win. Nothing is read from disk.

use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;
use std::time::Duration;

/// flashcache - a memcached-style in-memory cache server
#[derive(Debug, Clone, Parser)]
#[command(name = "flashcache", version, about)]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, env = "FLASHCACHE_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "FLASHCACHE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Run a background sweeper for expired keys every N milliseconds (0 = off)
    #[arg(long, env = "FLASHCACHE_SWEEP_INTERVAL_MS", default_value_t = 0)]
    pub sweep_interval_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "FLASHCACHE_LOG", default_value = "info")]
    pub log_level: String,

    /// Do not print the startup banner
    #[arg(long)]
    pub no_banner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sweep_interval_ms: 0,
            log_level: "info".to_string(),
            no_banner: false,
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base sweep interval, or `None` when the sweeper is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
    }
}
