/// Report command: totals from the primary log, rendered as tables.
use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tabled::{Table, Tabled};
use vigil_core::TrackerConfig;
use vigil_storage::format::format_duration;
use vigil_storage::{LogFile, SessionReporter, SessionSnapshot};

#[derive(Tabled)]
struct TotalRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Time Spent")]
    time_spent: String,
    #[tabled(rename = "Percentage")]
    percentage: String,
}

pub fn handle_report(group: &str) -> Result<()> {
    let config = TrackerConfig::load()?;
    let log = LogFile::new(config.primary_log_path.clone());
    let entries = log.read_entries()?;

    if entries.is_empty() {
        println!(
            "No usage recorded yet in {}",
            config.primary_log_path.display()
        );
        return Ok(());
    }

    let snapshot = SessionSnapshot::from_entries(entries);
    match group {
        "application" => print_totals(
            "Totals by application",
            &SessionReporter::totals_by_application(&snapshot),
        ),
        "context" => print_totals(
            "Totals by context",
            &SessionReporter::totals_by_context(&snapshot),
        ),
        "both" => {
            print_totals(
                "Totals by application",
                &SessionReporter::totals_by_application(&snapshot),
            );
            print_totals(
                "Totals by context",
                &SessionReporter::totals_by_context(&snapshot),
            );
        }
        _ => println!("Unknown grouping: {group}. Use 'application', 'context', or 'both'"),
    }

    Ok(())
}

/// Render one totals table, largest first.
pub fn print_totals(title: &str, totals: &HashMap<String, Duration>) {
    let grand_total: Duration = totals.values().sum();

    let mut rows: Vec<(String, Duration)> = totals
        .iter()
        .map(|(name, duration)| (name.clone(), *duration))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let table_rows: Vec<TotalRow> = rows
        .into_iter()
        .map(|(name, duration)| {
            let percentage = if grand_total.is_zero() {
                String::from("0%")
            } else {
                format!(
                    "{:.1}%",
                    duration.as_secs_f64() / grand_total.as_secs_f64() * 100.0
                )
            };
            TotalRow {
                name: if name.is_empty() {
                    String::from("(no window)")
                } else {
                    truncate_str(&name, 40)
                },
                time_spent: format_duration(duration),
                percentage,
            }
        })
        .collect();

    println!("\n{title}");
    println!("{}", Table::new(table_rows));
}

/// Cap a name at `max_chars` characters for the table, counting chars
/// rather than bytes so multi-byte names never split mid-character.
fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_leaves_short_names_alone() {
        assert_eq!(truncate_str("Chrome", 40), "Chrome");
        assert_eq!(truncate_str("Chrome", 6), "Chrome");
    }

    #[test]
    fn test_truncate_str_caps_long_names() {
        assert_eq!(truncate_str("hello world", 5), "hello...");
    }

    #[test]
    fn test_truncate_str_counts_chars_not_bytes() {
        assert_eq!(
            truncate_str("\u{4f60}\u{597d}\u{4e16}\u{754c}", 2),
            "\u{4f60}\u{597d}..."
        );
    }
}
