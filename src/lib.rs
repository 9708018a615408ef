//! # bulk-dl
//!
//! Authenticated bulk downloader with ordered fallback candidates.
//!
//! A run logs into a remote service once, then works through a list of named download tasks.
//! Each task carries one or more candidate requests that are tried in order until one answers
//! with HTTP 200. A candidate may ask for one member of the downloaded zip archive to be
//! extracted and copied to a final destination.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bulk_dl::{BulkDownloader, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_json(
//!         r#"{
//!             "base_url": "http://httpbin.org/",
//!             "login_path": "post",
//!             "download_actions": {
//!                 "png": {"url": "http://httpbin.org/image/png", "method": "get",
//!                         "filename": "image.png"}
//!             }
//!         }"#,
//!         "20240101-000000",
//!     )?;
//!
//!     let downloader = BulkDownloader::new(config)?;
//!     let report = downloader.run().await?;
//!     println!("{} of {} task(s) failed", report.failed_count(), report.tasks.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Run orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Archive member extraction
pub mod extraction;
/// Single candidate download attempt
pub mod fetcher;
/// Log sink setup
pub mod logging;
/// Ordered fallback over a task's candidates
pub mod resolver;
/// Login session
pub mod session;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Candidate, Config, DownloadActions, Task};
pub use downloader::BulkDownloader;
pub use error::{Error, ExtractError, FetchError, Result};
pub use session::Session;
pub use types::{DownloadOutcome, Event, ExtractionOutcome, HttpMethod, RunReport, TaskReport};
