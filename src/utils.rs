//! Utility functions for file operations and path manipulation

use crate::error::{Error, Result};
use filetime::FileTime;
use std::path::{Path, PathBuf};

/// Create `path` and any missing parents
///
/// An existing directory is fine. If `path` (or one of its parents) exists as something other
/// than a directory, [`Error::NotADirectory`] is returned.
///
/// # Examples
///
/// ```
/// use bulk_dl::utils::ensure_directory;
///
/// let dir = std::env::temp_dir().join("bulk-dl-doc").join("nested");
/// ensure_directory(&dir).unwrap();
/// assert!(dir.is_dir());
/// ```
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::NotADirectory {
            path: absolute(path),
        });
    }

    std::fs::create_dir_all(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists | std::io::ErrorKind::NotADirectory => {
            Error::NotADirectory {
                path: absolute(path),
            }
        }
        _ => Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create directory '{}': {}", path.display(), e),
        )),
    })
}

/// Name of the directory a downloaded archive is extracted into: the file name up to its first
/// period
///
/// # Examples
///
/// ```
/// use bulk_dl::utils::archive_stem;
///
/// assert_eq!(archive_stem("data.v2.zip"), "data");
/// assert_eq!(archive_stem("README"), "README");
/// ```
pub fn archive_stem(filename: &str) -> &str {
    match filename.find('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    }
}

/// The file a copy of `source` to `dest` writes: `dest` itself, or `<dest>/<source name>` when
/// `dest` is an existing directory
pub fn copy_target(source: &Path, dest: &Path) -> std::io::Result<PathBuf> {
    if !dest.is_dir() {
        return Ok(dest.to_path_buf());
    }
    let name = source.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("'{}' has no file name", source.display()),
        )
    })?;
    Ok(dest.join(name))
}

/// Copy a file, keeping its permissions and access/modification times
///
/// If `dest` is an existing directory the file is copied into it under its own name. Returns
/// the path actually written.
pub fn copy_preserving_times(source: &Path, dest: &Path) -> std::io::Result<PathBuf> {
    let target = copy_target(source, dest)?;

    std::fs::copy(source, &target)?;

    let metadata = std::fs::metadata(source)?;
    filetime::set_file_times(
        &target,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;

    Ok(target)
}

/// Absolute form of `path` for messages; falls back to the path as given
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
