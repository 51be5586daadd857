//! Storage Engine Module
//!
//! This module provides the cache store for flashcache: a thread-safe,
//! sharded key-value map whose entries carry an absolute expiry, plus an
//! optional background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ (opt-in)
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: 64 independent shards reduce lock contention
//! - **Lazy Expiry**: Expired keys are removed by the read that observes them
//! - **Active Expiry**: An optional sweeper reclaims expired keys nobody reads
//!
//! ## Example
//!
//! ```
//! use flashcache::storage::StorageEngine;
//! use bytes::Bytes;
//!
//! let engine = StorageEngine::new();
//!
//! engine.set(Bytes::from("session"), Bytes::from("token123"), 3600);
//! assert_eq!(engine.get(b"session"), Some(Bytes::from("token123")));
//! ```

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{expiry_from_ttl, Entry, StorageEngine, StorageStats, MAX_TTL};
pub use expiry::{ExpiryConfig, ExpirySweeper};
