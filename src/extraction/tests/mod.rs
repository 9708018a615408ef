use crate::config::Candidate;
use crate::error::ExtractError;
use crate::extraction::*;
use crate::types::ExtractionOutcome;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing the given files
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

/// Candidate with extraction enabled
fn zip_candidate(filename: &str, member: &str, destination: PathBuf) -> Candidate {
    Candidate {
        url: "http://example.com/data".to_string(),
        method: "get".to_string(),
        metadata: BTreeMap::new(),
        filename: filename.to_string(),
        extract_zip: true,
        zip_member_to_extract: Some(member.to_string()),
        zip_member_final_destination: Some(destination),
    }
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

// ---------------------------------------------------------------------------
// ZipExtractor
// ---------------------------------------------------------------------------

#[test]
fn test_is_zip_archive_checks_contents_not_extension() {
    let temp = TempDir::new().unwrap();

    let real = temp.path().join("payload.bin");
    create_zip_archive(&real, &[("a.txt", b"a")]);
    assert!(ZipExtractor::is_zip_archive(&real));

    let fake = temp.path().join("fake.zip");
    std::fs::write(&fake, b"<html>login required</html>").unwrap();
    assert!(!ZipExtractor::is_zip_archive(&fake));

    assert!(!ZipExtractor::is_zip_archive(&temp.path().join("missing.zip")));
}

#[test]
fn test_extract_member_extracts_only_requested_member() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("data.zip");
    create_zip_archive(
        &archive,
        &[
            ("readme.txt", b"ignore me"),
            ("nested/dir/report.csv", b"id,value\n1,42\n"),
            ("other.csv", b"ignore me too"),
        ],
    );
    let dest = temp.path().join("data");

    let extracted = ZipExtractor::extract_member(&archive, "nested/dir/report.csv", &dest).unwrap();

    assert_eq!(extracted, dest.join("nested/dir/report.csv"));
    assert_eq!(
        std::fs::read_to_string(&extracted).unwrap(),
        "id,value\n1,42\n"
    );
    assert_eq!(files_under(&dest), vec![PathBuf::from("nested/dir/report.csv")]);
}

#[test]
fn test_extract_member_missing_member() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("data.zip");
    create_zip_archive(&archive, &[("present.txt", b"x")]);

    let result = ZipExtractor::extract_member(&archive, "absent.txt", &temp.path().join("data"));

    assert_eq!(
        result,
        Err(ExtractError::MemberNotFound {
            archive: archive.clone(),
            member: "absent.txt".to_string(),
        })
    );
}

#[test]
fn test_extract_member_corrupted_archive() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("corrupt.zip");
    std::fs::write(&archive, b"PK\x03\x04 truncated garbage").unwrap();

    let result = ZipExtractor::extract_member(&archive, "x", &temp.path().join("corrupt"));

    assert!(
        matches!(result, Err(ExtractError::ExtractionFailed { .. })),
        "{result:?}"
    );
}

// ---------------------------------------------------------------------------
// extract pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_skipped_when_not_requested() {
    let temp = TempDir::new().unwrap();
    let mut candidate = zip_candidate("img.png", "x", temp.path().join("out"));
    candidate.extract_zip = false;

    let outcome = extract(temp.path(), "png", &candidate, &temp.path().join("img.png")).await;

    assert_eq!(outcome, ExtractionOutcome::SkippedNotZip);
}

#[tokio::test]
async fn test_extract_guards_missing_download() {
    let temp = TempDir::new().unwrap();
    let candidate = zip_candidate("data.zip", "a.txt", temp.path().join("a.txt"));
    let downloaded = temp.path().join("data.zip");

    let outcome = extract(temp.path(), "data", &candidate, &downloaded).await;

    assert_eq!(
        outcome,
        ExtractionOutcome::ExtractFailed(ExtractError::MissingArchive { path: downloaded })
    );
}

#[tokio::test]
async fn test_extract_rejects_non_zip_download() {
    let temp = TempDir::new().unwrap();
    let downloaded = temp.path().join("broken.zip");
    std::fs::write(&downloaded, b"this is not a zip").unwrap();
    let candidate = zip_candidate("broken.zip", "a.txt", temp.path().join("a.txt"));

    let outcome = extract(temp.path(), "broken", &candidate, &downloaded).await;

    assert_eq!(
        outcome,
        ExtractionOutcome::ExtractFailed(ExtractError::NotAZip {
            archive: downloaded
        })
    );
    assert!(!temp.path().join("broken").exists());
}

#[tokio::test]
async fn test_extract_reports_missing_settings() {
    let temp = TempDir::new().unwrap();
    let downloaded = temp.path().join("data.zip");
    create_zip_archive(&downloaded, &[("a.txt", b"a")]);

    let mut no_member = zip_candidate("data.zip", "a.txt", temp.path().join("a.txt"));
    no_member.zip_member_to_extract = None;
    let mut no_destination = zip_candidate("data.zip", "a.txt", temp.path().join("a.txt"));
    no_destination.zip_member_final_destination = None;

    assert_eq!(
        extract(temp.path(), "data", &no_member, &downloaded).await,
        ExtractionOutcome::ExtractFailed(ExtractError::MissingSetting {
            key: "zip_member_to_extract"
        })
    );
    assert_eq!(
        extract(temp.path(), "data", &no_destination, &downloaded).await,
        ExtractionOutcome::ExtractFailed(ExtractError::MissingSetting {
            key: "zip_member_final_destination"
        })
    );
}

#[tokio::test]
async fn test_extract_uses_stem_up_to_first_period() {
    let temp = TempDir::new().unwrap();
    let downloaded = temp.path().join("data.v2.zip");
    create_zip_archive(&downloaded, &[("inner/table.csv", b"1,2,3")]);
    let final_destination = temp.path().join("table.csv");
    let candidate = zip_candidate("data.v2.zip", "inner/table.csv", final_destination.clone());

    let outcome = extract(temp.path(), "data", &candidate, &downloaded).await;

    assert_eq!(outcome, ExtractionOutcome::Extracted(final_destination.clone()));
    assert!(temp.path().join("data/inner/table.csv").is_file());
    assert!(!temp.path().join("data.v2").exists());
    assert_eq!(std::fs::read(&final_destination).unwrap(), b"1,2,3");
}

#[tokio::test]
async fn test_extract_twice_overwrites_existing_destination() {
    let temp = TempDir::new().unwrap();
    let downloaded = temp.path().join("data.zip");
    let final_destination = temp.path().join("final.txt");
    let candidate = zip_candidate("data.zip", "member.txt", final_destination.clone());

    create_zip_archive(&downloaded, &[("member.txt", b"first")]);
    let first = extract(temp.path(), "data", &candidate, &downloaded).await;
    assert_eq!(first, ExtractionOutcome::Extracted(final_destination.clone()));

    create_zip_archive(&downloaded, &[("member.txt", b"second")]);
    let second = extract(temp.path(), "data", &candidate, &downloaded).await;

    assert_eq!(
        second,
        ExtractionOutcome::AlreadyExists(final_destination.clone())
    );
    assert_eq!(
        std::fs::read_to_string(&final_destination).unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_extract_into_directory_destination_checks_the_copied_file() {
    let temp = TempDir::new().unwrap();
    let downloaded = temp.path().join("data.zip");
    create_zip_archive(&downloaded, &[("reports/member.txt", b"first")]);
    let reports_dir = temp.path().join("reports");
    std::fs::create_dir(&reports_dir).unwrap();
    let candidate = zip_candidate("data.zip", "reports/member.txt", reports_dir.clone());

    let first = extract(temp.path(), "data", &candidate, &downloaded).await;

    // An existing directory alone does not count as an existing destination
    assert_eq!(
        first,
        ExtractionOutcome::Extracted(reports_dir.join("member.txt"))
    );

    create_zip_archive(&downloaded, &[("reports/member.txt", b"second")]);
    let second = extract(temp.path(), "data", &candidate, &downloaded).await;

    assert_eq!(
        second,
        ExtractionOutcome::AlreadyExists(reports_dir.join("member.txt"))
    );
    assert_eq!(
        std::fs::read_to_string(reports_dir.join("member.txt")).unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_extract_copy_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let downloaded = temp.path().join("data.zip");
    create_zip_archive(&downloaded, &[("member.txt", b"x")]);
    let final_destination = temp.path().join("no-such-dir").join("member.txt");
    let candidate = zip_candidate("data.zip", "member.txt", final_destination.clone());

    let outcome = extract(temp.path(), "data", &candidate, &downloaded).await;

    match outcome {
        ExtractionOutcome::CopyFailed(ExtractError::CopyFailed {
            source_path,
            dest_path,
            ..
        }) => {
            assert_eq!(source_path, temp.path().join("data").join("member.txt"));
            assert_eq!(dest_path, final_destination);
        }
        other => panic!("expected copy failure, got {other:?}"),
    }
    // The extracted member stays in the extraction directory
    assert!(temp.path().join("data").join("member.txt").is_file());
}
