/// Export command: write the primary log out as CSV, JSON, or XML.
use anyhow::Result;
use std::path::PathBuf;
use vigil_core::TrackerConfig;
use vigil_storage::{ExportError, ExportFormat, LogFile, SessionReporter, SessionSnapshot};

pub fn handle_export(format: &str, output: Option<String>) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let config = TrackerConfig::load()?;

    let log = LogFile::new(config.primary_log_path.clone());
    let snapshot = SessionSnapshot::from_entries(log.read_entries()?);

    let destination = output.map_or_else(
        || PathBuf::from(format!("vigil_export.{}", format.extension())),
        PathBuf::from,
    );

    match SessionReporter::export(&snapshot, format, &destination) {
        Ok(()) => {
            println!(
                "Exported {} entries to {}",
                snapshot.entries.len(),
                destination.display()
            );
            Ok(())
        }
        Err(ExportError::EmptySession) => {
            println!("Nothing to export: no usage recorded yet.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
