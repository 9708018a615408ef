//! Error types for bulk-dl
//!
//! Errors are split by severity:
//! - [`Error`] is what propagates out of the library. Only authentication, configuration and
//!   directory setup failures reach the process boundary; the task-level variants are caught by
//!   the orchestrator and recorded in the run report.
//! - [`FetchError`] describes why a single candidate attempt did not produce a file.
//! - [`ExtractError`] describes why the archive extraction step did not complete.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bulk-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bulk-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error that is not tied to a particular candidate
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Login request failed or was rejected by the remote service
    #[error("unable to establish network connection: {0}")]
    Connection(String),

    /// A configured directory path exists but is not a directory
    #[error("{} must be a directory or not yet exist", path.display())]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// A task was configured without any candidates
    #[error("download \"{task}\" has no candidates to attempt")]
    EmptyTask {
        /// The task name
        task: String,
    },

    /// A candidate names an HTTP method other than GET or POST
    #[error("download \"{task}\" method {method} is unsupported")]
    InvalidMethod {
        /// The task name
        task: String,
        /// The method string as configured
        method: String,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns true if this error only affects a single task and the run should continue
    pub fn is_task_level(&self) -> bool {
        matches!(self, Error::EmptyTask { .. } | Error::InvalidMethod { .. })
    }
}

/// Reasons a single candidate attempt produced no file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Method was neither GET nor POST after normalization
    #[error("unsupported method {method}")]
    InvalidMethod {
        /// The method string as configured
        method: String,
    },

    /// The server answered with anything other than 200
    #[error("non-200: {status}")]
    NonOkStatus {
        /// HTTP status code returned
        status: u16,
    },

    /// No response was received (connect, DNS, timeout, invalid URL)
    #[error("request failed: {reason}")]
    Request {
        /// Transport error description
        reason: String,
    },

    /// Writing the streamed body to disk failed part way
    #[error("write failed for {}: {reason}", path.display())]
    WriteFailed {
        /// The destination file
        path: PathBuf,
        /// I/O or stream error description
        reason: String,
    },
}

impl FetchError {
    /// Returns true if this failure must stop the fallback loop instead of moving on to the
    /// next candidate
    pub fn aborts_task(&self) -> bool {
        matches!(self, FetchError::InvalidMethod { .. })
    }
}

/// Reasons the extraction step did not produce a final copy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The downloaded file does not exist (every candidate failed before writing)
    #[error("downloaded file {} does not exist", path.display())]
    MissingArchive {
        /// Expected location of the download
        path: PathBuf,
    },

    /// `extract_zip` is set but a required companion setting is absent
    #[error("extract_zip is set but {key} is missing")]
    MissingSetting {
        /// Name of the missing candidate key
        key: &'static str,
    },

    /// The downloaded file is not a readable zip archive
    #[error("{} is not a valid zip file", archive.display())]
    NotAZip {
        /// The downloaded file
        archive: PathBuf,
    },

    /// The requested member is not present in the archive
    #[error("member {member} not found in {}", archive.display())]
    MemberNotFound {
        /// The archive that was searched
        archive: PathBuf,
        /// The requested member name
        member: String,
    },

    /// Archive corruption or I/O failure while extracting
    #[error("extraction failed for {}: {reason}", archive.display())]
    ExtractionFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Copying the extracted member to its final destination failed
    #[error("failed to copy {} to {}: {reason}", source_path.display(), dest_path.display())]
    CopyFailed {
        /// The extracted member
        source_path: PathBuf,
        /// The final destination
        dest_path: PathBuf,
        /// The reason the copy failed
        reason: String,
    },
}
