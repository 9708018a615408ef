use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Single-member extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Returns true if `path` can be opened as a ZIP archive
    ///
    /// The central directory is parsed, so the file extension plays no part.
    pub fn is_zip_archive(path: &Path) -> bool {
        std::fs::File::open(path)
            .ok()
            .and_then(|file| zip::ZipArchive::new(file).ok())
            .is_some()
    }

    /// Extract `member` from `archive_path` into `dest_dir`
    ///
    /// The member keeps its relative path inside the archive, so `dir/file.csv` lands at
    /// `<dest_dir>/dir/file.csv`. Returns the path of the extracted file.
    pub fn extract_member(
        archive_path: &Path,
        member: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ExtractError> {
        debug!(?archive_path, member, ?dest_dir, "attempting ZIP member extraction");

        let failed = |reason: String| ExtractError::ExtractionFailed {
            archive: archive_path.to_path_buf(),
            reason,
        };

        let file = std::fs::File::open(archive_path)
            .map_err(|e| failed(format!("failed to open ZIP archive: {}", e)))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| failed(format!("failed to read ZIP archive: {}", e)))?;

        let mut entry = archive.by_name(member).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => ExtractError::MemberNotFound {
                archive: archive_path.to_path_buf(),
                member: member.to_string(),
            },
            other => failed(format!("failed to read ZIP entry: {}", other)),
        })?;

        if entry.is_dir() {
            return Err(failed(format!("{} is a directory, not a file", member)));
        }

        let relative = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| failed(format!("{} has an unsafe path", member)))?;
        let target = dest_dir.join(relative);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| failed(format!("failed to create parent directories: {}", e)))?;
        }

        let mut outfile = std::fs::File::create(&target)
            .map_err(|e| failed(format!("failed to create output file: {}", e)))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| failed(format!("failed to extract file: {}", e)))?;

        Ok(target)
    }
}
