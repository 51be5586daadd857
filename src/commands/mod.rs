//! Command Handler Module
//!
//! This module implements the command processing layer for flashcache.
//! It receives parsed commands, executes them against the storage engine,
//! and returns the reply to write back.
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Command Parser  │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `set key value ttl` → `STORED`
//! - `get key [key ...]` → value blocks, then `END`
//! - `quit` → closes the connection
//!
//! Anything else is answered with `ERROR`.

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
