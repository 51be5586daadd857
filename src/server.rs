//! TCP Listener / Acceptor
//!
//! Accepts client connections and spawns one [`handle_connection`] task per
//! connection. The acceptor never waits for a handler, and there is no bound
//! on the number of concurrent handlers.
//!
//! A failed `accept` is retried with exponential backoff. Once the backoff
//! runs past its ceiling the acceptor gives up and returns
//! [`ServerError::Accept`], leaving it to the caller to shut down.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::StorageEngine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Errors that stop the acceptor.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `accept` kept failing until the backoff ceiling was reached
    #[error("accept failed {attempts} times in a row: {source}")]
    Accept {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Retry policy for failed `accept` calls.
#[derive(Debug, Clone, Copy)]
pub struct AcceptBackoff {
    /// Delay after the first failure; doubled after each further failure
    pub initial: Duration,
    /// Give up once the next delay would exceed this
    pub max: Duration,
}

impl Default for AcceptBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(50),
            max: Duration::from_millis(6400),
        }
    }
}

impl AcceptBackoff {
    /// Calls `accept` until it succeeds or the backoff is exhausted.
    pub async fn retry<F, Fut, T>(&self, mut accept: F) -> Result<T, ServerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::io::Result<T>>,
    {
        let mut backoff = self.initial;
        let mut attempts = 0u32;

        loop {
            match accept().await {
                Ok(accepted) => return Ok(accepted),
                Err(e) => {
                    attempts += 1;

                    if backoff > self.max {
                        error!(error = %e, attempts = attempts, "Giving up on accepting connections");
                        return Err(ServerError::Accept {
                            attempts,
                            source: e,
                        });
                    }

                    warn!(
                        error = %e,
                        retry_in_ms = backoff.as_millis() as u64,
                        "Failed to accept connection"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}

/// Accepts connections until `shutdown` resolves or accepting fails for good.
///
/// Handlers already running are not cancelled by shutdown; they end with
/// their clients or with the runtime.
pub async fn run(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
    shutdown: impl Future,
) -> Result<(), ServerError> {
    tokio::select! {
        result = accept_loop(listener, storage, stats, AcceptBackoff::default()) => result,
        _ = shutdown => {
            info!("Shutdown signal received, no longer accepting connections");
            Ok(())
        }
    }
}

/// Main loop that accepts incoming connections.
pub async fn accept_loop(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
    backoff: AcceptBackoff,
) -> Result<(), ServerError> {
    loop {
        let (stream, addr) = backoff.retry(|| listener.accept()).await?;

        let handler = CommandHandler::new(Arc::clone(&storage));
        let stats = Arc::clone(&stats);

        tokio::spawn(handle_connection(stream, addr, handler, stats));
    }
}
