//! flashcache - A Small Memcached-Style Cache Server
//!
//! This is the main entry point for the flashcache server.
//! It sets up logging, the storage engine and the TCP listener, then serves
//! connections until Ctrl+C.

use clap::Parser;
use flashcache::connection::ConnectionStats;
use flashcache::server;
use flashcache::storage::{ExpiryConfig, ExpirySweeper, StorageEngine};
use flashcache::Config;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
flashcache v{} - memcached-style in-memory cache
──────────────────────────────────────────────────
Server started on {}
Ready to accept connections.

    $ printf 'set greeting hello 60\r\nget greeting\r\nquit\r\n' | nc {} {}

Use Ctrl+C to shutdown gracefully.
"#,
        flashcache::VERSION,
        config.bind_address(),
        config.host,
        config.port
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Set up logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new());
    info!("Storage engine initialized");

    let sweeper = config.sweep_interval().map(|interval| {
        ExpirySweeper::start(
            Arc::clone(&storage),
            ExpiryConfig::with_base_interval(interval),
        )
    });
    if sweeper.is_none() {
        info!("Background expiry sweeper disabled, keys expire on read only");
    }

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    if !config.no_banner {
        print_banner(&config);
    }

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    let result = server::run(listener, Arc::clone(&storage), Arc::clone(&stats), shutdown).await;

    let storage_stats = storage.stats();
    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        keys = storage_stats.keys,
        hits = storage_stats.get_hits,
        misses = storage_stats.get_misses,
        expired = storage_stats.expired,
        "Server shutdown complete"
    );

    result?;
    Ok(())
}
