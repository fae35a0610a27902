//! Thread-safe accumulation of focused time per window key.
//!
//! The tracking loop is the only writer; the persister and any UI read
//! through `snapshot()`. The internal lock is held for single
//! operations only, never across I/O, so a background flush can never
//! stall the sampling loop behind a disk write.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use vigil_storage::{SessionSnapshot, UsageEntry, WindowKey};

struct AccumulatorState {
    start_time: DateTime<Local>,
    entries: HashMap<WindowKey, UsageEntry>,
}

pub struct UsageAccumulator {
    inner: Mutex<AccumulatorState>,
}

impl UsageAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AccumulatorState {
                start_time: Local::now(),
                entries: HashMap::new(),
            }),
        }
    }

    /// Add `elapsed` to the entry for `key`, creating it with the
    /// current wall-clock time as first-seen if absent. The entry's
    /// duration and existence change under one lock acquisition, so a
    /// concurrent snapshot never observes a torn entry.
    pub fn record(&self, key: &WindowKey, elapsed: Duration) {
        let mut state = self.inner.lock().unwrap();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| UsageEntry::new(key.clone(), Duration::ZERO, Some(Local::now().time())));
        entry.accumulated += elapsed;
    }

    /// Ensure an entry exists for `key`, stamping first-seen with the
    /// current wall-clock time if this is its first appearance. No time
    /// is added; the tracking loop calls this the moment a window comes
    /// into focus, before any interval has elapsed against it.
    pub fn touch(&self, key: &WindowKey) {
        let mut state = self.inner.lock().unwrap();
        state
            .entries
            .entry(key.clone())
            .or_insert_with(|| UsageEntry::new(key.clone(), Duration::ZERO, Some(Local::now().time())));
    }

    /// Consistent point-in-time copy of all entries, sorted into the
    /// canonical order.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock().unwrap();
        let start_time = state.start_time;
        let mut entries: Vec<UsageEntry> = state.entries.values().cloned().collect();
        drop(state);

        entries.sort_by(|a, b| {
            a.first_seen
                .cmp(&b.first_seen)
                .then_with(|| a.key.cmp(&b.key))
        });
        SessionSnapshot {
            start_time,
            entries,
        }
    }

    /// Reset for a fresh session: drops every entry and restarts the
    /// session clock. The only way entries are ever removed.
    pub fn clear(&self) {
        let mut state = self.inner.lock().unwrap();
        state.entries.clear();
        state.start_time = Local::now();
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Local> {
        self.inner.lock().unwrap().start_time
    }
}

impl Default for UsageAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_creates_entry_with_first_seen() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("Chrome", "GitHub");
        acc.record(&key, Duration::from_secs(2));

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].accumulated, Duration::from_secs(2));
        assert!(snapshot.entries[0].first_seen.is_some());
    }

    #[test]
    fn test_first_seen_is_set_exactly_once() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("Chrome", "GitHub");
        acc.record(&key, Duration::from_secs(1));
        let first = acc.snapshot().entries[0].first_seen;
        acc.record(&key, Duration::from_secs(1));
        assert_eq!(acc.snapshot().entries[0].first_seen, first);
    }

    #[test]
    fn test_touch_creates_a_zero_duration_entry() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("Chrome", "GitHub");
        acc.touch(&key);

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].accumulated, Duration::ZERO);
        assert!(snapshot.entries[0].first_seen.is_some());
    }

    #[test]
    fn test_record_after_touch_keeps_the_original_first_seen() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("Chrome", "GitHub");
        acc.touch(&key);
        let first = acc.snapshot().entries[0].first_seen;

        std::thread::sleep(Duration::from_millis(5));
        acc.record(&key, Duration::from_secs(1));

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.entries[0].first_seen, first);
        assert_eq!(snapshot.entries[0].accumulated, Duration::from_secs(1));
    }

    #[test]
    fn test_touch_on_an_existing_entry_changes_nothing() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("Chrome", "GitHub");
        acc.record(&key, Duration::from_secs(3));
        let before = acc.snapshot();

        acc.touch(&key);
        assert_eq!(acc.snapshot().entries, before.entries);
    }

    #[test]
    fn test_accumulated_is_monotonic() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("Code", "Main");
        let mut previous = Duration::ZERO;
        for _ in 0..10 {
            acc.record(&key, Duration::from_millis(250));
            let current = acc.snapshot().entries[0].accumulated;
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_snapshot_is_idempotent_without_records() {
        let acc = UsageAccumulator::new();
        acc.record(&WindowKey::new("A", "Main"), Duration::from_secs(1));
        acc.record(&WindowKey::new("B", "Main"), Duration::from_secs(2));

        let first = acc.snapshot();
        let second = acc.snapshot();
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.start_time, second.start_time);
    }

    #[test]
    fn test_snapshot_is_a_copy_not_a_view() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("A", "Main");
        acc.record(&key, Duration::from_secs(1));
        let snapshot = acc.snapshot();
        acc.record(&key, Duration::from_secs(5));
        assert_eq!(snapshot.entries[0].accumulated, Duration::from_secs(1));
    }

    #[test]
    fn test_clear_resets_entries_and_session_clock() {
        let acc = UsageAccumulator::new();
        acc.record(&WindowKey::new("A", "Main"), Duration::from_secs(1));
        let old_start = acc.start_time();
        std::thread::sleep(Duration::from_millis(5));
        acc.clear();

        assert!(acc.snapshot().is_empty());
        assert!(acc.start_time() > old_start);
    }

    #[test]
    fn test_sum_never_exceeds_elapsed_wall_clock() {
        let acc = UsageAccumulator::new();
        let key = WindowKey::new("A", "Main");
        let begin = std::time::Instant::now();
        for _ in 0..5 {
            std::thread::sleep(Duration::from_millis(2));
            // Record what actually elapsed, as the tracker does.
            acc.record(&key, Duration::from_millis(2));
        }
        let elapsed = begin.elapsed();
        assert!(acc.snapshot().total() <= elapsed);
    }

    #[test]
    fn test_concurrent_record_and_snapshot_sees_whole_entries() {
        let acc = Arc::new(UsageAccumulator::new());
        let writer = {
            let acc = Arc::clone(&acc);
            std::thread::spawn(move || {
                let key = WindowKey::new("Chrome", "GitHub");
                for _ in 0..1000 {
                    acc.record(&key, Duration::from_micros(100));
                }
            })
        };

        // Entries must appear atomically: any observed entry has both a
        // key and a first-seen time, and totals only ever grow.
        let mut last_total = Duration::ZERO;
        for _ in 0..100 {
            let snapshot = acc.snapshot();
            for entry in &snapshot.entries {
                assert!(entry.first_seen.is_some());
                assert!(!entry.key.application.is_empty());
            }
            let total = snapshot.total();
            assert!(total >= last_total);
            last_total = total;
        }
        writer.join().unwrap();

        assert_eq!(
            acc.snapshot().total(),
            Duration::from_micros(100) * 1000
        );
    }
}
