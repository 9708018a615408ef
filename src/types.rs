//! Core types and events for bulk-dl

use crate::error::{ExtractError, FetchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP method a candidate may use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Metadata sent as query parameters
    Get,
    /// Metadata sent as a form-encoded body
    Post,
}

impl HttpMethod {
    /// Normalize a configured method string: surrounding whitespace is ignored and case does not
    /// matter. Anything other than GET or POST is rejected.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(FetchError::InvalidMethod {
                method: raw.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Result of one candidate attempt, or of a whole task once reduced by the resolver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The body was written to this path
    Success(PathBuf),
    /// The attempt produced no usable file
    Failure(FetchError),
}

impl DownloadOutcome {
    /// Returns true for [`DownloadOutcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(_))
    }
}

/// Result of the extraction step for one task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Member extracted and copied to a previously absent final destination
    Extracted(PathBuf),
    /// Extraction was not requested for this candidate
    SkippedNotZip,
    /// Archive missing, invalid, or the member could not be extracted
    ExtractFailed(ExtractError),
    /// Member extracted but the final copy failed
    CopyFailed(ExtractError),
    /// Member extracted and copied over a file that already existed at the final destination
    AlreadyExists(PathBuf),
}

impl ExtractionOutcome {
    /// Returns true if the member reached its final destination
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ExtractionOutcome::Extracted(_) | ExtractionOutcome::AlreadyExists(_)
        )
    }

    /// Short description used in events and the run summary
    pub fn describe(&self) -> String {
        match self {
            ExtractionOutcome::Extracted(path) => format!("extracted to {}", path.display()),
            ExtractionOutcome::SkippedNotZip => "extraction not requested".to_string(),
            ExtractionOutcome::ExtractFailed(e) => format!("extraction failed: {}", e),
            ExtractionOutcome::CopyFailed(e) => format!("copy failed: {}", e),
            ExtractionOutcome::AlreadyExists(path) => {
                format!("extracted, overwrote existing {}", path.display())
            }
        }
    }
}

/// Event emitted while a run progresses
///
/// Consumers subscribe through [`crate::BulkDownloader::subscribe`]. Every event is also logged
/// through `tracing`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Login POST accepted
    LoggedIn {
        /// Login URL
        url: String,
        /// HTTP status of the login response
        status: u16,
    },

    /// A candidate request is about to be sent
    AttemptStarted {
        /// Task name
        task: String,
        /// Zero-based candidate index
        index: usize,
        /// Method as configured
        method: String,
        /// Candidate URL
        url: String,
    },

    /// A candidate attempt failed
    AttemptFailed {
        /// Task name
        task: String,
        /// Zero-based candidate index
        index: usize,
        /// Failure description
        reason: String,
    },

    /// A candidate's body was written to disk
    DownloadComplete {
        /// Task name
        task: String,
        /// Zero-based candidate index
        index: usize,
        /// Written file
        path: PathBuf,
    },

    /// Every candidate of a task failed
    TaskExhausted {
        /// Task name
        task: String,
        /// Number of candidates attempted
        attempts: usize,
    },

    /// A task was abandoned because of a configuration problem
    TaskAborted {
        /// Task name
        task: String,
        /// Error description
        error: String,
    },

    /// The extraction step finished
    ExtractionFinished {
        /// Task name
        task: String,
        /// True if the member reached its final destination
        success: bool,
        /// Outcome description
        detail: String,
    },

    /// All tasks were processed
    RunFinished {
        /// Number of tasks processed
        tasks: usize,
        /// Number of tasks that failed
        failed: usize,
        /// Elapsed time in milliseconds
        elapsed_ms: u64,
    },
}

/// What happened to one task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    /// Task name
    pub name: String,
    /// Reduced download outcome; `None` when the task was aborted before completing its
    /// candidate loop
    pub download: Option<DownloadOutcome>,
    /// Extraction outcome, present only when extraction was requested on the last attempted
    /// candidate
    pub extraction: Option<ExtractionOutcome>,
    /// Task-level error (empty candidate list, unsupported method)
    pub error: Option<String>,
}

impl TaskReport {
    /// A task fails if it was aborted, no candidate succeeded, or requested extraction did not
    /// reach its final destination
    pub fn is_failure(&self) -> bool {
        let download_ok = matches!(self.download, Some(DownloadOutcome::Success(_)));
        let extraction_ok = self
            .extraction
            .as_ref()
            .is_none_or(ExtractionOutcome::is_success);
        self.error.is_some() || !download_ok || !extraction_ok
    }
}

/// Aggregated outcome of a run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per task, in declaration order
    pub tasks: Vec<TaskReport>,
    /// Wall-clock time from login to the last task
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of failed tasks
    pub fn failed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_failure()).count()
    }

    /// Look up a task report by name
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}
