//! Ordered fallback over a task's candidates

use crate::config::{Candidate, Task};
use crate::error::{Error, FetchError, Result};
use crate::fetcher::{FetchContext, fetch};
use crate::types::{DownloadOutcome, Event};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Reduced outcome of a task's candidate loop
#[derive(Debug)]
pub struct Resolution<'t> {
    /// Success with the first written file, or the failure of the last candidate
    pub outcome: DownloadOutcome,
    /// The candidate that produced `outcome`; decides whether extraction runs
    pub last_attempted: &'t Candidate,
    /// Number of candidates attempted
    pub attempts: usize,
}

/// Try each candidate in order until one succeeds
///
/// Candidate-level failures (non-200, transport error, write error) move on to the next
/// candidate. When the list is exhausted a single [`Event::TaskExhausted`] is emitted and the
/// last failure is returned together with the last candidate tried.
///
/// # Errors
///
/// - [`Error::EmptyTask`] if the task has no candidates
/// - [`Error::InvalidMethod`] if a candidate's method is not GET or POST; later candidates are
///   not attempted
pub async fn resolve<'t>(
    ctx: &FetchContext<'_>,
    task: &'t Task,
    events: &broadcast::Sender<Event>,
) -> Result<Resolution<'t>> {
    let mut last_failure: Option<(&'t Candidate, FetchError)> = None;

    for (index, candidate) in task.candidates.iter().enumerate() {
        info!(
            task = %task.name,
            method = %candidate.method,
            metadata = ?candidate.metadata,
            "now attempting download"
        );
        debug!(task = %task.name, ?candidate, "full download instructions");
        events
            .send(Event::AttemptStarted {
                task: task.name.clone(),
                index,
                method: candidate.method.clone(),
                url: candidate.url.clone(),
            })
            .ok();

        match fetch(ctx, candidate).await {
            DownloadOutcome::Success(path) => {
                info!(task = %task.name, "*** download was successful ***");
                events
                    .send(Event::DownloadComplete {
                        task: task.name.clone(),
                        index,
                        path: path.clone(),
                    })
                    .ok();
                return Ok(Resolution {
                    outcome: DownloadOutcome::Success(path),
                    last_attempted: candidate,
                    attempts: index + 1,
                });
            }
            DownloadOutcome::Failure(e) if e.aborts_task() => {
                let err = Error::InvalidMethod {
                    task: task.name.clone(),
                    method: candidate.method.clone(),
                };
                error!(task = %task.name, error = %err, "abandoning download");
                return Err(err);
            }
            DownloadOutcome::Failure(e) => {
                warn!(task = %task.name, index, reason = %e, "download attempt failed");
                events
                    .send(Event::AttemptFailed {
                        task: task.name.clone(),
                        index,
                        reason: e.to_string(),
                    })
                    .ok();
                last_failure = Some((candidate, e));
            }
        }
    }

    let Some((last_attempted, reason)) = last_failure else {
        error!(task = %task.name, "download has no candidates");
        return Err(Error::EmptyTask {
            task: task.name.clone(),
        });
    };

    let attempts = task.candidates.len();
    error!(task = %task.name, attempts, "*** no iteration of download was successful ***");
    events
        .send(Event::TaskExhausted {
            task: task.name.clone(),
            attempts,
        })
        .ok();

    Ok(Resolution {
        outcome: DownloadOutcome::Failure(reason),
        last_attempted,
        attempts,
    })
}
