//! The tracking loop: samples the focused window on a fixed cadence,
//! classifies titles into window keys, and commits elapsed time to the
//! accumulator.
//!
//! Accounting is commit-every-tick: each tick commits the time since
//! the last commit to the key observed on the *previous* tick, then
//! advances. A crash can lose at most one sampling interval, unlike
//! commit-on-transition which loses the whole tail of the current
//! stint.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

use crate::accumulator::UsageAccumulator;
use crate::classifier::classify;
use crate::config::TrackerConfig;
use crate::monitor::WindowSampler;
use crate::persister::IncrementalPersister;
use vigil_storage::{LogFile, SessionSnapshot, WindowKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Running,
}

pub struct Tracker {
    config: TrackerConfig,
    sampler: Box<dyn WindowSampler>,
    accumulator: Arc<UsageAccumulator>,
    primary_log: Arc<Mutex<LogFile>>,
    incremental_log: Arc<Mutex<LogFile>>,
    state: TrackerState,
    previous_key: Option<WindowKey>,
    last_commit: Instant,
    stint_start: Instant,
    shutdown_tx: Option<watch::Sender<bool>>,
    persister_handle: Option<JoinHandle<()>>,
}

impl Tracker {
    /// Create a tracker. Configuration is validated here; a zero
    /// interval or conflicting filters never reach the loop.
    ///
    /// # Errors
    ///
    /// Returns the validation error for a rejected configuration.
    pub fn new(config: TrackerConfig, sampler: Box<dyn WindowSampler>) -> Result<Self> {
        config.validate()?;

        let primary_log = Arc::new(Mutex::new(LogFile::new(config.primary_log_path.clone())));
        // Both logs pointed at one file must share one lock, or their
        // writes could interleave.
        let incremental_log = if config.incremental_log_path == config.primary_log_path {
            Arc::clone(&primary_log)
        } else {
            Arc::new(Mutex::new(LogFile::new(
                config.incremental_log_path.clone(),
            )))
        };

        let now = Instant::now();
        Ok(Self {
            config,
            sampler,
            accumulator: Arc::new(UsageAccumulator::new()),
            primary_log,
            incremental_log,
            state: TrackerState::Idle,
            previous_key: None,
            last_commit: now,
            stint_start: now,
            shutdown_tx: None,
            persister_handle: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Shared handle for concurrent readers (reporting, a UI).
    #[must_use]
    pub fn accumulator(&self) -> Arc<UsageAccumulator> {
        Arc::clone(&self.accumulator)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.accumulator.snapshot()
    }

    /// Idle to Running: reset the session and spawn the flush task.
    /// Must be called within a tokio runtime. No-op when already
    /// running.
    pub fn start(&mut self) {
        if self.state == TrackerState::Running {
            log::warn!("tracker is already running");
            return;
        }

        self.accumulator.clear();
        self.previous_key = None;
        self.last_commit = Instant::now();
        self.stint_start = self.last_commit;

        let (tx, rx) = watch::channel(false);
        let persister = IncrementalPersister::new(
            Arc::clone(&self.accumulator),
            Arc::clone(&self.incremental_log),
            Duration::from_secs(self.config.flush_interval_seconds),
            rx,
        );
        self.persister_handle = Some(persister.spawn());
        self.shutdown_tx = Some(tx);
        self.state = TrackerState::Running;
        log::info!(
            "tracking started (sampling every {}s, flushing every {}s)",
            self.config.sampling_interval_seconds,
            self.config.flush_interval_seconds
        );
    }

    /// Running to Idle. Commits the tail stint, stops the flush task,
    /// and flushes both logs before returning, so a report requested
    /// right after sees complete data.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush task panicked. Log-write failures
    /// are warnings, consistent with how they are handled mid-session.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != TrackerState::Running {
            return Ok(());
        }

        self.commit_elapsed();
        if let Some(previous) = self.previous_key.take() {
            log::info!(
                "{previous} was focused for {}s at stop",
                self.stint_start.elapsed().as_secs()
            );
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.persister_handle.take() {
            handle.await?;
        }

        let snapshot = self.accumulator.snapshot();
        if snapshot.is_empty() {
            log::debug!("empty session, nothing to flush");
        } else {
            {
                let log = self.incremental_log.lock().unwrap();
                if let Err(e) = log.write_snapshot(&snapshot) {
                    log::warn!("final incremental flush failed: {e}");
                }
            }
            let log = self.primary_log.lock().unwrap();
            match log.merge_snapshot(&snapshot) {
                Ok(()) => log::info!(
                    "session merged into {} ({} entries, {} tracked)",
                    log.path().display(),
                    snapshot.entries.len(),
                    vigil_storage::format::format_duration(snapshot.total())
                ),
                Err(e) => log::warn!("final flush to primary log failed: {e}"),
            }
        }

        self.state = TrackerState::Idle;
        log::info!("tracking stopped");
        Ok(())
    }

    /// Run the loop until Ctrl-C, then stop.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown finalization fails.
    pub async fn run_until_shutdown(&mut self) -> Result<()> {
        self.start();
        let mut ticker = interval(Duration::from_secs(self.config.sampling_interval_seconds));

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = tokio::signal::ctrl_c() => {
                    log::info!("received Ctrl-C, stopping tracker");
                    break;
                }
            }
        }

        self.stop().await
    }

    /// One sampling tick. Never fails: sampler errors degrade to
    /// "focus unchanged" and nothing else here can fail.
    async fn tick(&mut self) {
        if self.state != TrackerState::Running {
            return;
        }

        let observed = match self.sampler.active_window_title().await {
            Ok(title) => Some(classify(title.as_deref().unwrap_or(""))),
            Err(e) => {
                log::debug!("sampler failure, assuming focus unchanged: {e}");
                None
            }
        };

        self.commit_elapsed();

        if let Some(current) = observed {
            // First-seen is stamped the moment a window comes into
            // focus, not an interval later when its first commit lands.
            if self.config.allows(&current) {
                self.accumulator.touch(&current);
            }
            if self.previous_key.as_ref() != Some(&current) {
                if let Some(previous) = &self.previous_key {
                    log::info!(
                        "{previous} was focused for {}s",
                        self.stint_start.elapsed().as_secs()
                    );
                }
                log::debug!("focus changed to {current}");
                self.stint_start = Instant::now();
                self.previous_key = Some(current);
            }
        }
    }

    /// Commit time since the last commit to the previously observed
    /// key. Filtered keys advance the clock without being recorded, so
    /// their time is deliberately unattributed.
    fn commit_elapsed(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_commit;
        self.last_commit = now;

        if let Some(previous) = &self.previous_key {
            if self.config.allows(previous) {
                self.accumulator.record(previous, elapsed);
            }
        }
    }
}
