use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of a trackable activity: the application plus whatever
/// document, tab, or workspace its window title carried.
///
/// Equality is exact and case-sensitive; both fields are trimmed at
/// construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowKey {
    pub application: String,
    pub context: String,
}

impl WindowKey {
    #[must_use]
    pub fn new(application: &str, context: &str) -> Self {
        Self {
            application: application.trim().to_string(),
            context: context.trim().to_string(),
        }
    }

    /// Reserved key recorded when no foreground window could be observed.
    #[must_use]
    pub fn no_window() -> Self {
        Self::new("", "Main")
    }

    #[must_use]
    pub fn is_no_window(&self) -> bool {
        self.application.is_empty()
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_no_window() {
            write!(f, "(no window)")
        } else {
            write!(f, "{} / {}", self.application, self.context)
        }
    }
}

/// Accumulated usage for one window key within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub key: WindowKey,
    /// Total focused time. Monotonically non-decreasing while tracking.
    pub accumulated: Duration,
    /// Wall-clock time the key was first observed, `None` when merged
    /// from a log row whose time of day was unknown.
    pub first_seen: Option<NaiveTime>,
}

impl UsageEntry {
    #[must_use]
    pub fn new(key: WindowKey, accumulated: Duration, first_seen: Option<NaiveTime>) -> Self {
        Self {
            key,
            accumulated,
            first_seen,
        }
    }
}

/// Point-in-time, read-only copy of the accumulator state.
///
/// Handed to the persister and the reporter; neither ever mutates the
/// live accumulator through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub start_time: DateTime<Local>,
    pub entries: Vec<UsageEntry>,
}

impl SessionSnapshot {
    /// Build a snapshot from loose entries, sorted into the canonical
    /// order (first seen, then key). `start_time` is the moment of the
    /// call, which is all a re-read log can offer.
    #[must_use]
    pub fn from_entries(mut entries: Vec<UsageEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.first_seen
                .cmp(&b.first_seen)
                .then_with(|| a.key.cmp(&b.key))
        });
        Self {
            start_time: Local::now(),
            entries,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all accumulated durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.entries.iter().map(|e| e.accumulated).sum()
    }
}
