//! Single candidate download attempt

use crate::config::Candidate;
use crate::error::FetchError;
use crate::session::Session;
use crate::types::{DownloadOutcome, HttpMethod};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Everything a candidate attempt needs besides the candidate itself
#[derive(Clone, Copy, Debug)]
pub struct FetchContext<'a> {
    /// Authenticated session
    pub session: &'a Session,
    /// Directory receiving downloaded files
    pub download_dir: &'a Path,
    /// Delete the destination file when streaming fails part way
    pub remove_partial_downloads: bool,
}

impl FetchContext<'_> {
    /// Where a candidate's body is written
    pub fn destination(&self, candidate: &Candidate) -> PathBuf {
        self.download_dir.join(&candidate.filename)
    }
}

/// Attempt one candidate
///
/// Only an exact 200 counts as success. The body is streamed to
/// `<download_dir>/<candidate.filename>`, replacing any existing file. Failures are logged and
/// returned, never raised.
pub async fn fetch(ctx: &FetchContext<'_>, candidate: &Candidate) -> DownloadOutcome {
    let method = match HttpMethod::parse(&candidate.method) {
        Ok(method) => method,
        Err(e) => {
            error!(url = %candidate.url, method = %candidate.method, "download method is unsupported");
            return DownloadOutcome::Failure(e);
        }
    };

    let client = ctx.session.client();
    let request = match method {
        HttpMethod::Get => client.get(&candidate.url).query(&candidate.metadata),
        HttpMethod::Post => client.post(&candidate.url).form(&candidate.metadata),
    };

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %candidate.url, %method, error = %e, "download request failed");
            return DownloadOutcome::Failure(FetchError::Request {
                reason: e.to_string(),
            });
        }
    };

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        warn!(
            url = %candidate.url,
            %method,
            metadata = ?candidate.metadata,
            status = status.as_u16(),
            "download could *NOT* be started"
        );
        return DownloadOutcome::Failure(FetchError::NonOkStatus {
            status: status.as_u16(),
        });
    }

    let destination = ctx.destination(candidate);
    info!(url = %candidate.url, ?destination, "download successfully started");

    match stream_to_file(response, &destination).await {
        Ok(bytes) => {
            info!(?destination, bytes, "download successfully completed");
            DownloadOutcome::Success(destination)
        }
        Err(e) => {
            error!(?destination, error = %e, "download was unsuccessful");
            if ctx.remove_partial_downloads {
                match tokio::fs::remove_file(&destination).await {
                    Ok(()) => debug!(?destination, "removed partial download"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!(?destination, error = %e, "failed to remove partial download"),
                }
            }
            DownloadOutcome::Failure(FetchError::WriteFailed {
                path: destination,
                reason: e.to_string(),
            })
        }
    }
}

/// Copy the response body chunk by chunk into `destination`, returning the byte count
async fn stream_to_file(response: reqwest::Response, destination: &Path) -> std::io::Result<u64> {
    let mut file = tokio::fs::File::create(destination).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                format!("connection error while streaming body: {}", e),
            )
        })?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
