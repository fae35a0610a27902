//! Background flush of accumulator state to the incremental log.
//!
//! Runs as its own tokio task on the flush cadence and talks to the
//! tracking loop only through the shared accumulator handle. The
//! incremental log is rewritten with the full snapshot every cycle, so
//! re-reading it can never double-count.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::accumulator::UsageAccumulator;
use vigil_storage::LogFile;

pub struct IncrementalPersister {
    accumulator: Arc<UsageAccumulator>,
    log: Arc<Mutex<LogFile>>,
    cadence: Duration,
    shutdown: watch::Receiver<bool>,
}

impl IncrementalPersister {
    #[must_use]
    pub fn new(
        accumulator: Arc<UsageAccumulator>,
        log: Arc<Mutex<LogFile>>,
        cadence: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            accumulator,
            log,
            cadence,
            shutdown,
        }
    }

    /// Spawn the flush task. It exits when the shutdown channel fires
    /// or its sender is dropped.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        // First flush lands one full cadence in. Flushing at spawn
        // would rewrite the log while the fresh session is still
        // empty, destroying whatever a crashed previous session left
        // behind.
        let mut ticker = interval_at(Instant::now() + self.cadence, self.cadence);
        let mut shutdown = self.shutdown.clone();
        log::debug!(
            "incremental persister started (every {}s)",
            self.cadence.as_secs()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.flush(),
                _ = shutdown.changed() => break,
            }
        }
        log::debug!("incremental persister stopped");
    }

    /// One flush cycle. Snapshot first, then write: the accumulator
    /// lock is never held across the file write. Failures are warnings;
    /// the next cycle retries with a fresh snapshot.
    fn flush(&self) {
        let snapshot = self.accumulator.snapshot();
        if snapshot.is_empty() {
            log::debug!("nothing accrued yet, leaving the incremental log untouched");
            return;
        }
        let log = self.log.lock().unwrap();
        if let Err(e) = log.write_snapshot(&snapshot) {
            log::warn!("incremental flush failed, will retry next cycle: {e}");
        } else {
            log::debug!(
                "flushed {} entries to {}",
                snapshot.entries.len(),
                log.path().display()
            );
        }
    }
}
