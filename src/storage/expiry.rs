//! Background Expiry Sweeper
//!
//! The request path only expires keys lazily: an entry that is never read
//! again stays resident forever. When enabled (`--sweep-interval-ms`), this
//! task periodically removes such entries. It never changes what `get` or
//! `set` observe, only how long dead entries occupy memory.
//!
//! The sweep interval adapts: a sweep that reclaims a large share of the
//! keyspace halves the interval, an empty sweep doubles it, both bounded by
//! the configured limits.

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Starting interval between sweeps
    pub base_interval: Duration,

    /// Lower bound for the adaptive interval
    pub min_interval: Duration,

    /// Upper bound for the adaptive interval
    pub max_interval: Duration,

    /// Speed up when more than this fraction of resident keys was reclaimed
    pub speedup_threshold: f64,
}

impl ExpiryConfig {
    /// Builds a configuration around `base`, allowing the interval to move
    /// between a tenth of it and ten times it.
    pub fn with_base_interval(base: Duration) -> Self {
        Self {
            base_interval: base,
            min_interval: (base / 10).max(Duration::from_millis(1)),
            max_interval: base * 10,
            speedup_threshold: 0.25,
        }
    }

    /// Computes the interval to wait after a sweep that removed `expired` of
    /// `resident` keys.
    pub fn next_interval(&self, current: Duration, expired: u64, resident: u64) -> Duration {
        if resident == 0 || expired == 0 {
            return (current * 2).min(self.max_interval);
        }

        let rate = expired as f64 / resident as f64;
        if rate > self.speedup_threshold {
            (current / 2).max(self.min_interval)
        } else {
            current
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task is stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Spawns the sweeper on the current Tokio runtime.
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            interval_ms = config.base_interval.as_millis() as u64,
            "Background expiry sweeper started"
        );
        tokio::spawn(sweeper_loop(engine, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the sweeper. Called automatically on drop.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            debug!("Background expiry sweeper stopping");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut current_interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(current_interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let resident = engine.len();
        let expired = engine.cleanup_expired();
        current_interval = config.next_interval(current_interval, expired, resident);

        if expired > 0 {
            debug!(
                expired = expired,
                keys_remaining = engine.len(),
                next_ms = current_interval.as_millis() as u64,
                "Expired keys cleaned up"
            );
        } else {
            trace!(next_ms = current_interval.as_millis() as u64, "Nothing to sweep");
        }
    }
}
