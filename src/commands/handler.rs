//! Command Handler
//!
//! Executes parsed commands against the storage engine and builds the
//! reply for each one.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │  Command    │───>│  execute()  │───>│  Response   │     │
//! │  └─────────────┘    └──────┬──────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                      StorageEngine                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::protocol::{Command, Response, ValueBlock};
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Dispatches commands to the storage engine.
///
/// Cheap to clone: every connection gets its own handler sharing one engine.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Returns the shared storage engine.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Executes a command and returns the response.
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Set { key, value, ttl } => self.cmd_set(key, value, ttl),
            Command::Get { keys } => self.cmd_get(keys),
            Command::Quit => Response::Close,
            Command::Invalid(reason) => {
                debug!(error = %reason, "Rejected command");
                Response::Error
            }
        }
    }

    /// SET key value ttl
    fn cmd_set(&self, key: Bytes, value: Bytes, ttl: i64) -> Response {
        self.storage.set(key, value, ttl);
        Response::Stored
    }

    /// GET key [key ...]
    ///
    /// One value block per hit, in request order. Misses are silent.
    fn cmd_get(&self, keys: Vec<Bytes>) -> Response {
        let blocks = keys
            .into_iter()
            .filter_map(|key| {
                self.storage
                    .get(&key)
                    .map(|value| ValueBlock { key, value })
            })
            .collect();

        Response::Values(blocks)
    }
}
