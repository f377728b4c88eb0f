//! Locating and loading record files.

use std::fs;
use std::path::{Path, PathBuf};

use records_core::ScanConfig;
use serde_json::Value;

use crate::RecordError;

/// Lists `*.json` files in `dir`, optionally restricted to names starting
/// with `prefix`.
///
/// Returns files sorted by filename. A failure while iterating the
/// directory, including a single unreadable entry, is a
/// [`RecordError::DirectoryRead`] and aborts the listing in every mode.
pub fn list_json_files(dir: &Path, prefix: Option<&str>) -> Result<Vec<PathBuf>, RecordError> {
    let directory_error = |source| RecordError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(directory_error)? {
        let path = entry.map_err(directory_error)?.path();
        if !path.is_file() {
            continue;
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let prefix_matches = match prefix {
            Some(prefix) => path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix)),
            None => true,
        };

        if is_json && prefix_matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Value-bearing documents, selected by the configured filename prefix.
pub fn observation_files(dir: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, RecordError> {
    list_json_files(dir, Some(&config.observation_prefix))
}

/// Reads and decodes one document.
pub fn load_document(path: &Path) -> Result<Value, RecordError> {
    let text = fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RecordError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Resource-kind tag: the part of the file stem before the first `-`.
pub fn resource_prefix(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    stem.split('-').next()
}
