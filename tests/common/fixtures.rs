//! Archive fixtures and configuration builders

use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;

/// Build an in-memory ZIP archive holding the given members
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// A minimal PNG signature followed by filler, enough to tell files apart
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend_from_slice(b"not really an image");
    bytes
}

/// JSON configuration for a run against `base_url`, with every directory under `root`
pub fn config_json(base_url: &str, root: &Path, download_actions: Value) -> String {
    json!({
        "log_directory": root.join("logs"),
        "log_file_name": "script_log-{timestamp}.log",
        "download_archive_directory": root.join("archive"),
        "base_url": format!("{}/", base_url),
        "login_path": "login",
        "login_form_data": {"custname": "test_username", "custemail": "test_email"},
        "download_actions": download_actions,
    })
    .to_string()
}
