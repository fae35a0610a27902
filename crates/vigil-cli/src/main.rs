mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Focused-window usage tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Track the focused window until Ctrl-C
    Run {
        /// Sampling interval in seconds (overrides config)
        #[arg(short = 'i', long)]
        interval: Option<u64>,
        /// Flush interval in seconds (overrides config)
        #[arg(short = 'f', long)]
        flush_interval: Option<u64>,
    },
    /// Show totals recorded in the primary log
    Report {
        /// Group totals by: application, context, or both
        #[arg(default_value = "both")]
        group: String,
    },
    /// Export the primary log
    Export {
        /// Output format: csv, json, or xml
        #[arg(default_value = "csv")]
        format: String,
        /// Destination path (defaults to vigil_export.<format>)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Write a default config file if none exists
    Init,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            interval,
            flush_interval,
        } => commands::run::handle_run(interval, flush_interval).await,
        Commands::Report { group } => commands::report::handle_report(&group),
        Commands::Export { format, output } => commands::export::handle_export(&format, output),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::handle_show(),
            ConfigAction::Init => commands::config::handle_init(),
            ConfigAction::Path => commands::config::handle_path(),
        },
    }
}
