//! Normalization of exported FHIR clinical-record files into comparable values.
//!
//! Every document is a standalone JSON file named `<ResourceKind>-<id>.json`.
//! The same concept appears in several shapes across producer versions, so
//! each reader here inspects the decoded `serde_json::Value` and maps the
//! shape it finds onto the types in [`records_core`].

use std::io;
use std::path::{Path, PathBuf};

use records_core::{ScanConfig, SchemaError};
use serde::Serialize;

pub mod aggregate;
pub mod discovery;
pub mod extract;
pub mod listing;
pub mod normalize;
pub mod series;

pub use aggregate::{list_categories, list_prefixes, list_vitals, CategoryReport, VitalsReport};
pub use discovery::{list_json_files, load_document, observation_files, resource_prefix};
pub use extract::{extract_from_document, extract_record, extract_value, ExtractedRecord};
pub use listing::{
    list_conditions, list_medications, list_procedures, ConditionRecord, Listing,
    MedicationRecord, ProcedureRecord,
};
pub use normalize::{
    code_text, get_reference_range, get_value_quantity, matches_category, resolve_categories,
    resolve_values, BARE_CATEGORY_WEIGHT, STRUCTURED_CATEGORY_WEIGHT,
};
pub use series::{extract_all_values, Series};

/// Failure to turn one file (or the directory itself) into a document.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("cannot list directory {}: {source}", path.display())]
    DirectoryRead { path: PathBuf, source: io::Error },
    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unexpected document layout in {}: {source}", path.display())]
    Schema { path: PathBuf, source: SchemaError },
}

impl RecordError {
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryRead { path, .. }
            | Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::Schema { path, .. } => path,
        }
    }

    /// Per-file failures may be skipped in lenient scans; a missing
    /// directory never is.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, Self::DirectoryRead { .. })
    }

    pub(crate) fn schema(path: &Path, source: SchemaError) -> Self {
        Self::Schema {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A file left out of a lenient scan, and why.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl From<&RecordError> for SkippedFile {
    fn from(err: &RecordError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Applies the scan mode to per-file results.
pub(crate) struct SkipLog<'a> {
    config: &'a ScanConfig,
    skipped: Vec<SkippedFile>,
}

impl<'a> SkipLog<'a> {
    pub(crate) fn new(config: &'a ScanConfig) -> Self {
        Self {
            config,
            skipped: Vec::new(),
        }
    }

    /// `Ok(None)` when the failure was recorded and the scan may continue.
    pub(crate) fn absorb<T>(&mut self, result: Result<T, RecordError>) -> Result<Option<T>, RecordError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_skippable() && !self.config.is_strict() => {
                tracing::warn!(path = %err.path().display(), error = %err, "Skipping record");
                self.skipped.push(SkippedFile::from(&err));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn into_skipped(self) -> Vec<SkippedFile> {
        self.skipped
    }
}
