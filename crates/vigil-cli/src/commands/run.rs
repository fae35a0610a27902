/// Run command: foreground tracking until Ctrl-C, then a session summary.
use anyhow::Result;
use vigil_core::{create_sampler, Tracker, TrackerConfig};
use vigil_storage::SessionReporter;

use super::report::print_totals;

pub async fn handle_run(interval: Option<u64>, flush_interval: Option<u64>) -> Result<()> {
    let mut config = TrackerConfig::load()?;
    if let Some(seconds) = interval {
        config.sampling_interval_seconds = seconds;
    }
    if let Some(seconds) = flush_interval {
        config.flush_interval_seconds = seconds;
    }

    let sampler = create_sampler()?;
    let mut tracker = Tracker::new(config, sampler)?;

    println!("Tracking focused windows. Press Ctrl-C to stop.");
    tracker.run_until_shutdown().await?;

    let snapshot = tracker.snapshot();
    if snapshot.is_empty() {
        println!("Nothing was recorded this session.");
    } else {
        print_totals(
            "Session totals by application",
            &SessionReporter::totals_by_application(&snapshot),
        );
    }

    Ok(())
}
