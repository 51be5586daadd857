//! # flashcache - A Small Memcached-Style Cache Server
//!
//! flashcache is an in-memory key-value cache that speaks a subset of the
//! memcached text protocol over TCP. Clients store short-lived values with
//! `set`, read them back with `get`, and leave with `quit`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              flashcache                                 │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │              StorageEngine                   │   │
//! │  │   Parser    │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │             │    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │  └─────────────┘    │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashcache::connection::ConnectionStats;
//! use flashcache::server;
//! use flashcache::storage::StorageEngine;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Arc::new(StorageEngine::new());
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:11211").await?;
//!
//!     server::run(listener, storage, stats, tokio::signal::ctrl_c()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! | Request | Response |
//! |---|---|
//! | `set <key> <value> <ttlSeconds>` | `STORED` |
//! | `get <key> [<key> ...]` | `VALUE <key> <len>` + value per hit, then `END` |
//! | `quit` | connection closed |
//! | anything else | `ERROR` |
//!
//! Keys and values are single tokens without spaces. A TTL of zero or less
//! stores the value already expired.
//!
//! ## Expiry
//!
//! Keys are expired lazily: the `get` that finds an entry past its expiry
//! removes it. An optional background sweeper (`--sweep-interval-ms`)
//! reclaims entries that are never read again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, ParseError, Response};
pub use server::ServerError;
pub use storage::{ExpiryConfig, ExpirySweeper, StorageEngine};

/// The default port flashcache listens on (same as memcached)
pub const DEFAULT_PORT: u16 = 11211;

/// The default host flashcache binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of flashcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
