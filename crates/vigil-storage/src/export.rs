//! Session reporting: totals by application or context, and export of a
//! snapshot to CSV, JSON, or XML. All operations are pure reads of a
//! [`SessionSnapshot`]; nothing here touches the live accumulator.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ExportError;
use crate::format::{format_duration, format_first_seen};
use crate::logfile::CSV_HEADER;
use crate::models::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xml,
}

impl ExportFormat {
    /// File extension for the format, used for default destinations.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// One exported row, shared between the JSON serializer and the CSV/XML
/// emitters so all three formats carry identical values.
#[derive(Debug, Serialize)]
struct ExportRow {
    #[serde(rename = "Application")]
    application: String,
    #[serde(rename = "Context")]
    context: String,
    #[serde(rename = "Time Spent")]
    time_spent: String,
    #[serde(rename = "Time of Day")]
    time_of_day: String,
}

pub struct SessionReporter;

impl SessionReporter {
    /// Total focused time per application, summed across contexts.
    #[must_use]
    pub fn totals_by_application(snapshot: &SessionSnapshot) -> HashMap<String, Duration> {
        let mut totals: HashMap<String, Duration> = HashMap::new();
        for entry in &snapshot.entries {
            *totals.entry(entry.key.application.clone()).or_default() += entry.accumulated;
        }
        totals
    }

    /// Total focused time per context, summed across applications.
    #[must_use]
    pub fn totals_by_context(snapshot: &SessionSnapshot) -> HashMap<String, Duration> {
        let mut totals: HashMap<String, Duration> = HashMap::new();
        for entry in &snapshot.entries {
            *totals.entry(entry.key.context.clone()).or_default() += entry.accumulated;
        }
        totals
    }

    /// Export the snapshot to `destination` in the given format.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::EmptySession` for a snapshot with no
    /// entries (no file is written), or an I/O/serialization error.
    pub fn export(
        snapshot: &SessionSnapshot,
        format: ExportFormat,
        destination: &Path,
    ) -> Result<(), ExportError> {
        if snapshot.is_empty() {
            return Err(ExportError::EmptySession);
        }

        let content = match format {
            ExportFormat::Csv => Self::to_csv(snapshot),
            ExportFormat::Json => Self::to_json(snapshot)?,
            ExportFormat::Xml => Self::to_xml(snapshot),
        };

        std::fs::write(destination, content).map_err(|source| ExportError::Write {
            path: destination.to_path_buf(),
            source,
        })
    }

    fn rows(snapshot: &SessionSnapshot) -> Vec<ExportRow> {
        snapshot
            .entries
            .iter()
            .map(|entry| ExportRow {
                application: entry.key.application.clone(),
                context: entry.key.context.clone(),
                time_spent: format_duration(entry.accumulated),
                time_of_day: format_first_seen(entry.first_seen),
            })
            .collect()
    }

    fn to_csv(snapshot: &SessionSnapshot) -> String {
        use crate::format::escape_csv;

        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for row in Self::rows(snapshot) {
            out.push_str(&format!(
                "{},{},{},{}\n",
                escape_csv(&row.application),
                escape_csv(&row.context),
                row.time_spent,
                row.time_of_day,
            ));
        }
        out
    }

    fn to_json(snapshot: &SessionSnapshot) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&Self::rows(snapshot))?)
    }

    fn to_xml(snapshot: &SessionSnapshot) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<UsageData>\n");
        for row in Self::rows(snapshot) {
            out.push_str("  <Entry>\n");
            out.push_str(&format!(
                "    <Application>{}</Application>\n",
                escape_xml(&row.application)
            ));
            out.push_str(&format!(
                "    <Context>{}</Context>\n",
                escape_xml(&row.context)
            ));
            out.push_str(&format!("    <TimeSpent>{}</TimeSpent>\n", row.time_spent));
            out.push_str(&format!(
                "    <TimeOfDay>{}</TimeOfDay>\n",
                row.time_of_day
            ));
            out.push_str("  </Entry>\n");
        }
        out.push_str("</UsageData>\n");
        out
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
