//! Run orchestration
//!
//! [`BulkDownloader`] walks the configured tasks in declaration order. Each task goes through
//! the fallback resolver and, when the last attempted candidate asks for it, the archive
//! extractor. Task failures are recorded in the [`RunReport`]; only login failure stops a run.


use crate::config::{Config, Task};
use crate::error::{ExtractError, FetchError, Result};
use crate::extraction;
use crate::fetcher::FetchContext;
use crate::resolver::{Resolution, resolve};
use crate::session::Session;
use crate::types::{DownloadOutcome, Event, ExtractionOutcome, RunReport, TaskReport};
use crate::utils::{absolute, ensure_directory};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Main downloader instance
pub struct BulkDownloader {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration, immutable for the lifetime of the downloader
    pub(crate) config: Config,
}

impl BulkDownloader {
    /// Create a new downloader
    ///
    /// Creates the download archive directory. Fails with
    /// [`Error::NotADirectory`](crate::Error::NotADirectory) if that path is an existing file.
    pub fn new(config: Config) -> Result<Self> {
        let download_dir = config.download_dir();
        info!(path = %absolute(download_dir).display(), "download archive path");
        if let Err(e) = ensure_directory(download_dir) {
            error!(error = %e, "cannot use download archive directory");
            return Err(e);
        }

        // Large enough that a subscriber reading after the run sees every event of a typical
        // task list
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self { event_tx, config })
    }

    /// Subscribe to run events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than 1000 events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bulk_dl::{BulkDownloader, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = Config::load(std::path::Path::new("config.json"))?;
    ///     let downloader = BulkDownloader::new(config)?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("Event: {:?}", event);
    ///         }
    ///     });
    ///
    ///     let report = downloader.run().await?;
    ///     println!("{} task(s) failed", report.failed_count());
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Log in, then process every task in declaration order
    ///
    /// # Errors
    ///
    /// Only a failed login ([`Error::Connection`](crate::Error::Connection)) or an HTTP client
    /// that cannot be built is returned; no task is attempted in that case.
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();

        let session = Session::new(self.config.download.request_timeout)?;
        let status = session.login(&self.config.login).await?;
        self.emit_event(Event::LoggedIn {
            url: self.config.login.login_url(),
            status,
        });

        let ctx = FetchContext {
            session: &session,
            download_dir: self.config.download_dir(),
            remove_partial_downloads: self.config.download.remove_partial_downloads,
        };

        let mut report = RunReport::default();
        for task in &self.config.download_actions {
            let task_report = self.run_task(&ctx, task).await?;
            report.tasks.push(task_report);
        }
        report.elapsed = started.elapsed();

        let failed = report.failed_count();
        info!(
            tasks = report.tasks.len(),
            failed,
            "total execution time: {:.2} seconds",
            report.elapsed.as_secs_f64()
        );
        self.emit_event(Event::RunFinished {
            tasks: report.tasks.len(),
            failed,
            elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        });

        Ok(report)
    }

    /// Resolve one task and run extraction when its last attempted candidate requests it
    ///
    /// Task-level errors are recorded in the returned report; anything else is propagated.
    async fn run_task(&self, ctx: &FetchContext<'_>, task: &Task) -> Result<TaskReport> {
        let resolution = match resolve(ctx, task, &self.event_tx).await {
            Ok(resolution) => resolution,
            Err(e) if e.is_task_level() => {
                self.emit_event(Event::TaskAborted {
                    task: task.name.clone(),
                    error: e.to_string(),
                });
                return Ok(TaskReport {
                    name: task.name.clone(),
                    download: None,
                    extraction: None,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => return Err(e),
        };

        let Resolution {
            outcome,
            last_attempted,
            ..
        } = resolution;

        let extraction = if last_attempted.extract_zip {
            let result = match written_this_run(&outcome, ctx.remove_partial_downloads) {
                Some(downloaded) => {
                    extraction::extract(ctx.download_dir, &task.name, last_attempted, downloaded)
                        .await
                }
                None => {
                    // A file left at the destination by an earlier run must not be promoted
                    let path = ctx.destination(last_attempted);
                    error!(task = %task.name, ?path, "download failed, nothing to extract");
                    ExtractionOutcome::ExtractFailed(ExtractError::MissingArchive { path })
                }
            };
            self.emit_event(Event::ExtractionFinished {
                task: task.name.clone(),
                success: result.is_success(),
                detail: result.describe(),
            });
            Some(result)
        } else {
            None
        };

        Ok(TaskReport {
            name: task.name.clone(),
            download: Some(outcome),
            extraction,
            error: None,
        })
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// The file a task's download wrote during this run, if any
///
/// A successful download, or a stream that failed part way with its partial file kept.
fn written_this_run(outcome: &DownloadOutcome, remove_partial_downloads: bool) -> Option<&Path> {
    match outcome {
        DownloadOutcome::Success(path) => Some(path.as_path()),
        DownloadOutcome::Failure(FetchError::WriteFailed { path, .. })
            if !remove_partial_downloads =>
        {
            Some(path.as_path())
        }
        DownloadOutcome::Failure(_) => None,
    }
}
