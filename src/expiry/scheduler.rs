//! Periodic sweep of expired entries.
//!
//! One background task fires [`ExpirationTracker::cleanup_expired`] on a
//! fixed interval. Read-heavy entry points additionally sweep synchronously
//! before listing, so the periodic tick only bounds how long expired content
//! can linger unobserved. The tracker's own lock keeps sweeps from
//! overlapping.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::ExpirationTracker;

/// Shortest and longest accepted sweep intervals
const MIN_INTERVAL: Duration = Duration::from_secs(60);
const MAX_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default sweep interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Starts and owns the periodic sweep task
pub struct SweepScheduler {
    interval: Duration,
}

impl SweepScheduler {
    /// Create a scheduler with the given interval, clamped to the accepted
    /// 1–30 minute band.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
        }
    }

    /// The effective interval after clamping
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the sweep task. It runs until the returned handle is stopped
    /// or dropped.
    pub fn start(&self, tracker: Arc<ExpirationTracker>) -> SweepHandle {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick: sweep once on startup.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = tracker.cleanup_expired().await;
                        if !removed.is_empty() {
                            tracing::info!("Sweep removed {} expired entr(ies)", removed.len());
                        }
                    }
                    _ = stop_rx.recv() => {
                        tracing::info!("Sweep scheduler stopping");
                        break;
                    }
                }
            }
        });

        tracing::info!("Sweeping expired entries every {:?}", interval);

        SweepHandle { stop_tx, task }
    }
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

/// Handle to the running sweep task
pub struct SweepHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the sweep task and wait for it to finish
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}
