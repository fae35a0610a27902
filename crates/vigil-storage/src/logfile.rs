//! CSV log files: the primary log (merged on stop) and the incremental
//! log (rewritten on every flush cycle).
//!
//! Callers that share one file across tasks wrap the `LogFile` in an
//! `Arc<Mutex<_>>` so writes never interleave; the struct itself holds
//! no open handle between operations.

use chrono::NaiveTime;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PersistenceError;
use crate::format::{
    escape_csv, format_duration, format_first_seen, parse_duration, parse_first_seen,
    split_csv_line,
};
use crate::models::{SessionSnapshot, UsageEntry, WindowKey};

/// Header row of both log files and the CSV export.
pub const CSV_HEADER: &str = "Application,Context,Time Spent,Time of Day";

pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with the full snapshot (header plus one row per
    /// entry). Written to a sibling temp file and renamed, so a crash
    /// mid-flush cannot truncate the previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` if the file cannot be written.
    pub fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        self.ensure_parent()?;

        let mut content = String::from(CSV_HEADER);
        content.push('\n');
        for entry in &snapshot.entries {
            content.push_str(&csv_row(entry));
            content.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Append data rows. Emits the header only when the file is new or
    /// empty; appending to an existing log never re-emits it.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the file cannot be opened or written.
    pub fn append_entries(&self, entries: &[UsageEntry]) -> Result<(), PersistenceError> {
        self.ensure_parent()?;

        let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| PersistenceError::Open {
                path: self.path.clone(),
                source,
            })?;

        let mut content = String::new();
        if needs_header {
            content.push_str(CSV_HEADER);
            content.push('\n');
        }
        for entry in entries {
            content.push_str(&csv_row(entry));
            content.push('\n');
        }

        file.write_all(content.as_bytes())
            .map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Read the log back into entries. A missing file reads as empty;
    /// rows sharing a key (from earlier appends) are combined, summing
    /// durations and keeping the earliest first-seen time.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Malformed` on an unparseable row and
    /// `PersistenceError::Open` if the file exists but cannot be read.
    pub fn read_entries(&self) -> Result<Vec<UsageEntry>, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistenceError::Open {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut combined: HashMap<WindowKey, (Duration, Option<NaiveTime>)> = HashMap::new();
        let mut order: Vec<WindowKey> = Vec::new();

        for (index, line) in content.lines().enumerate() {
            if line.is_empty() || line == CSV_HEADER {
                continue;
            }
            let (key, accumulated, first_seen) =
                parse_row(line).ok_or(PersistenceError::Malformed {
                    path: self.path.clone(),
                    line: index + 1,
                })?;

            let slot = combined.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (Duration::ZERO, None)
            });
            slot.0 += accumulated;
            slot.1 = earliest(slot.1, first_seen);
        }

        Ok(order
            .into_iter()
            .map(|key| {
                let (accumulated, first_seen) = combined[&key];
                UsageEntry::new(key, accumulated, first_seen)
            })
            .collect())
    }

    /// Merge a snapshot into this file: durations are summed per key
    /// and the earliest first-seen time wins. When every snapshot key
    /// is new to the file, rows are appended instead of rewriting.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the file cannot be read or written.
    pub fn merge_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        let existing = match self.read_entries() {
            Ok(entries) => entries,
            Err(e @ PersistenceError::Malformed { .. }) => {
                log::warn!("discarding unreadable log during merge: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if existing.is_empty() {
            return self.write_snapshot(snapshot);
        }

        let overlap = snapshot
            .entries
            .iter()
            .any(|e| existing.iter().any(|x| x.key == e.key));
        if !overlap {
            return self.append_entries(&snapshot.entries);
        }

        let mut merged: Vec<UsageEntry> = existing;
        for entry in &snapshot.entries {
            if let Some(slot) = merged.iter_mut().find(|x| x.key == entry.key) {
                slot.accumulated += entry.accumulated;
                slot.first_seen = earliest(slot.first_seen, entry.first_seen);
            } else {
                merged.push(entry.clone());
            }
        }

        self.write_snapshot(&SessionSnapshot::from_entries(merged))
    }

    fn ensure_parent(&self) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Open {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// One data row. Embedded line breaks in titles are folded to spaces;
/// the log is a line-oriented format.
fn csv_row(entry: &UsageEntry) -> String {
    format!(
        "{},{},{},{}",
        escape_csv(&sanitize(&entry.key.application)),
        escape_csv(&sanitize(&entry.key.context)),
        format_duration(entry.accumulated),
        format_first_seen(entry.first_seen),
    )
}

fn sanitize(field: &str) -> String {
    field.replace(['\n', '\r'], " ")
}

fn parse_row(line: &str) -> Option<(WindowKey, Duration, Option<NaiveTime>)> {
    let fields = split_csv_line(line)?;
    if fields.len() != 4 {
        return None;
    }
    let key = WindowKey::new(&fields[0], &fields[1]);
    let accumulated = parse_duration(&fields[2])?;
    let first_seen = parse_first_seen(&fields[3]);
    Some((key, accumulated, first_seen))
}

fn earliest(a: Option<NaiveTime>, b: Option<NaiveTime>) -> Option<NaiveTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(t), None) | (None, Some(t)) => Some(t),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::TempDir;

    fn entry(app: &str, ctx: &str, secs: u64, first_seen: Option<&str>) -> UsageEntry {
        UsageEntry::new(
            WindowKey::new(app, ctx),
            Duration::from_secs(secs),
            first_seen.and_then(parse_first_seen),
        )
    }

    fn snapshot(entries: Vec<UsageEntry>) -> SessionSnapshot {
        SessionSnapshot {
            start_time: Local::now(),
            entries,
        }
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("usage.csv"));
        let entries = vec![
            entry("Chrome", "GitHub", 125, Some("09:15:00")),
            entry("Code", "main.rs - vigil", 3700, None),
        ];
        log.write_snapshot(&snapshot(entries.clone())).unwrap();

        let read = log.read_entries().unwrap();
        assert_eq!(read, entries);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("absent.csv"));
        assert!(log.read_entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_emits_header_exactly_once() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("usage.csv"));
        log.append_entries(&[entry("A", "Main", 1, None)]).unwrap();
        log.append_entries(&[entry("B", "Main", 2, None)]).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches(CSV_HEADER).count(), 1);
        assert!(content.starts_with(CSV_HEADER));
        assert_eq!(log.read_entries().unwrap().len(), 2);
    }

    #[test]
    fn test_read_combines_duplicate_keys() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("usage.csv"));
        log.append_entries(&[entry("A", "Main", 10, Some("10:00:00"))])
            .unwrap();
        log.append_entries(&[entry("A", "Main", 5, Some("09:00:00"))])
            .unwrap();

        let read = log.read_entries().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].accumulated, Duration::from_secs(15));
        assert_eq!(read[0].first_seen, parse_first_seen("09:00:00"));
    }

    #[test]
    fn test_merge_sums_durations_and_keeps_earliest_first_seen() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("usage.csv"));
        log.write_snapshot(&snapshot(vec![entry("A", "Main", 10, Some("10:00:00"))]))
            .unwrap();
        log.merge_snapshot(&snapshot(vec![
            entry("A", "Main", 7, Some("08:30:00")),
            entry("B", "Docs", 3, Some("11:00:00")),
        ]))
        .unwrap();

        let read = log.read_entries().unwrap();
        assert_eq!(read.len(), 2);
        let a = read.iter().find(|e| e.key.application == "A").unwrap();
        assert_eq!(a.accumulated, Duration::from_secs(17));
        assert_eq!(a.first_seen, parse_first_seen("08:30:00"));
    }

    #[test]
    fn test_merge_with_disjoint_keys_appends_without_header() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("usage.csv"));
        log.write_snapshot(&snapshot(vec![entry("A", "Main", 10, None)]))
            .unwrap();
        log.merge_snapshot(&snapshot(vec![entry("B", "Main", 3, None)]))
            .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches(CSV_HEADER).count(), 1);
        assert_eq!(log.read_entries().unwrap().len(), 2);
    }

    #[test]
    fn test_rewrite_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("incremental.csv"));
        log.write_snapshot(&snapshot(vec![entry("A", "Main", 1, None)]))
            .unwrap();
        log.write_snapshot(&snapshot(vec![entry("A", "Main", 5, None)]))
            .unwrap();

        // Re-reading never double-counts: the file always holds the
        // latest full snapshot, not a history of appended deltas.
        let read = log.read_entries().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].accumulated, Duration::from_secs(5));
    }

    #[test]
    fn test_titles_containing_commas_and_quotes_survive() {
        let dir = TempDir::new().unwrap();
        let log = LogFile::new(dir.path().join("usage.csv"));
        let entries = vec![entry("Editor", "notes, \"draft\" 3", 42, Some("12:00:00"))];
        log.write_snapshot(&snapshot(entries.clone())).unwrap();
        assert_eq!(log.read_entries().unwrap(), entries);
    }

    #[test]
    fn test_malformed_row_is_reported_with_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage.csv");
        std::fs::write(&path, format!("{CSV_HEADER}\nA,Main,bogus,N/A\n")).unwrap();

        let log = LogFile::new(path);
        match log.read_entries() {
            Err(PersistenceError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }
}
