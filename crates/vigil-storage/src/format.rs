//! Wire formatting for the CSV schema: `HH:MM:SS` durations (hours may
//! exceed 24), first-seen times of day, and CSV field escaping.

use chrono::NaiveTime;
use std::time::Duration;

/// Literal written when an entry's first-seen time is unknown.
pub const UNKNOWN_TIME: &str = "N/A";

/// Format a duration as zero-padded `HH:MM:SS`.
///
/// Sub-second remainders are truncated, not rounded, so a formatted
/// duration never exceeds the real one.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse an `HH:MM:SS` duration back. Hours may exceed 24.
#[must_use]
pub fn parse_duration(s: &str) -> Option<Duration> {
    let mut parts = s.splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if minutes > 59 || seconds > 59 {
        return None;
    }
    Some(Duration::from_secs(hours * 3600 + minutes * 60 + seconds))
}

/// Format a first-seen wall-clock time, or `N/A` when unknown.
#[must_use]
pub fn format_first_seen(first_seen: Option<NaiveTime>) -> String {
    first_seen.map_or_else(
        || UNKNOWN_TIME.to_string(),
        |t| t.format("%H:%M:%S").to_string(),
    )
}

/// Parse a first-seen column value. `N/A` and garbage both map to
/// `None`; a log row with a bad clock still carries a usable duration.
#[must_use]
pub fn parse_first_seen(s: &str) -> Option<NaiveTime> {
    if s == UNKNOWN_TIME {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S").ok()
}

/// Escape a string for CSV format
#[must_use]
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split one CSV line into unescaped fields. Handles quoted fields
/// containing commas, newlines already folded into the line, and `""`
/// escapes. Returns `None` if a quoted field is unterminated.
#[must_use]
pub fn split_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}
