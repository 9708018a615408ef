//! Archive member extraction
//!
//! After a task's candidate loop, a candidate with `extract_zip` set has one member pulled out
//! of its downloaded archive into `<download_dir>/<stem>/` and copied to a final destination.
//! Every failure is logged and returned as an [`ExtractionOutcome`]; nothing here aborts a run.

mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use zip::ZipExtractor;

use crate::config::Candidate;
use crate::error::ExtractError;
use crate::types::ExtractionOutcome;
use crate::utils::{archive_stem, copy_preserving_times, copy_target};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{error, info, warn};

/// Extract the candidate's member from `downloaded` and copy it to its final destination
///
/// Steps, each ending the pipeline with a logged outcome on failure:
/// 1. `downloaded` must exist
/// 2. `zip_member_to_extract` and `zip_member_final_destination` must be set
/// 3. `downloaded` must be a readable ZIP archive
/// 4. the member is extracted under `<download_dir>/<archive_stem(filename)>/`
/// 5. an existing final destination is reported and overwritten
/// 6. the member is copied with its timestamps to the final destination
///
/// Returns [`ExtractionOutcome::SkippedNotZip`] untouched when `extract_zip` is not set.
pub async fn extract(
    download_dir: &Path,
    task: &str,
    candidate: &Candidate,
    downloaded: &Path,
) -> ExtractionOutcome {
    if !candidate.extract_zip {
        return ExtractionOutcome::SkippedNotZip;
    }

    match tokio::fs::try_exists(downloaded).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            error!(task, ?downloaded, "download is missing, nothing to extract");
            return ExtractionOutcome::ExtractFailed(ExtractError::MissingArchive {
                path: downloaded.to_path_buf(),
            });
        }
    }

    let (member, final_destination) = match required_settings(candidate) {
        Ok(settings) => settings,
        Err(e) => {
            error!(task, error = %e, "extraction is misconfigured");
            return ExtractionOutcome::ExtractFailed(e);
        }
    };

    let archive = downloaded.to_path_buf();
    let is_zip = spawn_blocking(move || ZipExtractor::is_zip_archive(&archive))
        .await
        .unwrap_or(false);
    if !is_zip {
        error!(task, ?downloaded, "download is not a valid zip file");
        return ExtractionOutcome::ExtractFailed(ExtractError::NotAZip {
            archive: downloaded.to_path_buf(),
        });
    }

    info!(task, member, "now attempting to extract file using zip decompression");
    let contents_dir = download_dir.join(archive_stem(&candidate.filename));

    let extracted = {
        let archive = downloaded.to_path_buf();
        let member_owned = member.to_string();
        let dest = contents_dir.clone();
        spawn_blocking(move || ZipExtractor::extract_member(&archive, &member_owned, &dest))
            .await
            .unwrap_or_else(|e| {
                Err(ExtractError::ExtractionFailed {
                    archive: downloaded.to_path_buf(),
                    reason: format!("extraction task panicked: {}", e),
                })
            })
    };
    let extracted = match extracted {
        Ok(path) => {
            info!(task, member, ?path, "member was successfully extracted");
            path
        }
        Err(e) => {
            error!(task, member, error = %e, "member was *not* successfully extracted");
            return ExtractionOutcome::ExtractFailed(e);
        }
    };

    let target = match copy_target(&extracted, &final_destination) {
        Ok(target) => target,
        Err(e) => {
            error!(task, member, ?final_destination, error = %e, "file could *not* be copied");
            return ExtractionOutcome::CopyFailed(ExtractError::CopyFailed {
                source_path: extracted,
                dest_path: final_destination,
                reason: e.to_string(),
            });
        }
    };
    let already_exists = tokio::fs::try_exists(&target).await.unwrap_or(false);
    if already_exists {
        warn!(task, member, ?target, "final destination already exists");
    } else {
        info!(task, member, ?target, "final destination does not yet exist");
    }

    let copied = {
        let source = extracted.clone();
        let dest = final_destination.clone();
        spawn_blocking(move || copy_preserving_times(&source, &dest))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(e.to_string())))
    };
    match copied {
        Ok(path) => {
            info!(task, member, ?path, "file successfully copied");
            if already_exists {
                ExtractionOutcome::AlreadyExists(path)
            } else {
                ExtractionOutcome::Extracted(path)
            }
        }
        Err(e) => {
            error!(task, member, ?final_destination, error = %e, "file could *not* be copied");
            ExtractionOutcome::CopyFailed(ExtractError::CopyFailed {
                source_path: extracted,
                dest_path: final_destination,
                reason: e.to_string(),
            })
        }
    }
}

/// The member name and final destination, both required once `extract_zip` is set
fn required_settings(candidate: &Candidate) -> Result<(&str, PathBuf), ExtractError> {
    let member = candidate
        .zip_member_to_extract
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or(ExtractError::MissingSetting {
            key: "zip_member_to_extract",
        })?;
    let destination = candidate
        .zip_member_final_destination
        .clone()
        .ok_or(ExtractError::MissingSetting {
            key: "zip_member_final_destination",
        })?;
    Ok((member, destination))
}
