//! bulk-dl - command line entry point
//!
//! Loads the JSON configuration, sets up logging, logs in and runs every download task.

use anyhow::Context;
use bulk_dl::{BulkDownloader, Config, logging};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

#[derive(Debug, Parser)]
#[command(name = "bulk-dl", version, about = "Log in once and run a list of fallback downloads")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Exit with a non-zero status when any task failed
    #[arg(long)]
    fail_on_task_error: bool,

    /// Print the parsed download actions as JSON and exit
    #[arg(long)]
    print_actions: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config).with_context(|| {
        format!(
            "a configuration file must exist at {}",
            cli.config.display()
        )
    })?;

    if cli.print_actions {
        println!("{}", serde_json::to_string_pretty(&config.download_actions)?);
        return Ok(ExitCode::SUCCESS);
    }

    logging::init(&config.logging).context("logging could not be initiated")?;

    let downloader = BulkDownloader::new(config)?;
    let report = match downloader.run().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "run aborted");
            return Err(e.into());
        }
    };

    let failed = report.failed_count();
    if failed > 0 {
        warn!(failed, total = report.tasks.len(), "some downloads did not complete");
        if cli.fail_on_task_error {
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
