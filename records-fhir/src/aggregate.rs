//! Read-only counting scans over a clinical-records directory.

use std::path::Path;

use records_core::{ScanConfig, SchemaError, Tally};
use serde_json::Value;

use crate::discovery::{list_json_files, load_document, resource_prefix};
use crate::normalize::{code_text, matches_category, resolve_categories};
use crate::{RecordError, SkipLog, SkippedFile};

/// Code counts for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalsReport {
    pub category: String,
    /// Matching files per distinct `code.text`.
    pub codes: Tally,
    pub skipped: Vec<SkippedFile>,
}

/// Category weights across a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    /// Labels by descending weight, ties in encounter order.
    pub ranked: Vec<String>,
    pub weights: Tally,
    /// Every file visited, including skipped ones.
    pub file_count: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Counts, per code, the files whose category includes `category`.
pub fn list_vitals<I, P>(
    files: I,
    category: &str,
    config: &ScanConfig,
) -> Result<VitalsReport, RecordError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut codes = Tally::new();
    let mut skips = SkipLog::new(config);

    for file in files {
        let path = file.as_ref();
        let code = skips.absorb(matching_code(path, category))?.flatten();
        if let Some(code) = code {
            codes.add(&code, 1.0);
        }
    }

    tracing::debug!(category, codes = codes.len(), "Listed codes");
    Ok(VitalsReport {
        category: category.to_string(),
        codes,
        skipped: skips.into_skipped(),
    })
}

fn matching_code(path: &Path, category: &str) -> Result<Option<String>, RecordError> {
    let document = load_document(path)?;
    let check = || -> Result<Option<String>, SchemaError> {
        if !matches_category(document_category(&document)?, category)? {
            return Ok(None);
        }
        code_text(&document).map(|code| Some(code.to_string()))
    };
    check().map_err(|source| RecordError::schema(path, source))
}

/// Accumulates category weights over every JSON file in `dir`.
///
/// `one_prefix` restricts the scan to files whose name starts with it, and
/// `only_first` keeps only the first entry of list-shaped categories.
pub fn list_categories(
    dir: &Path,
    only_first: bool,
    one_prefix: Option<&str>,
    config: &ScanConfig,
) -> Result<CategoryReport, RecordError> {
    let files = list_json_files(dir, one_prefix)?;
    let mut weights = Tally::new();
    let mut skips = SkipLog::new(config);

    for path in &files {
        if let Some(found) = skips.absorb(file_categories(path, only_first))? {
            weights.merge(&found);
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        files = files.len(),
        categories = weights.len(),
        "Listed categories"
    );
    Ok(CategoryReport {
        ranked: weights.ranked(),
        weights,
        file_count: files.len(),
        skipped: skips.into_skipped(),
    })
}

fn file_categories(path: &Path, only_first: bool) -> Result<Tally, RecordError> {
    let document = load_document(path)?;
    document_category(&document)
        .and_then(|raw| resolve_categories(raw, only_first))
        .map_err(|source| RecordError::schema(path, source))
}

/// Counts `*.json` files in `dir` by resource-kind prefix.
pub fn list_prefixes(dir: &Path) -> Result<Tally, RecordError> {
    let mut prefixes = Tally::new();
    for path in list_json_files(dir, None)? {
        if let Some(prefix) = resource_prefix(&path) {
            prefixes.add(prefix, 1.0);
        }
    }
    Ok(prefixes)
}

fn document_category(document: &Value) -> Result<&Value, SchemaError> {
    document
        .get("category")
        .ok_or_else(|| SchemaError::missing("category"))
}
