//! Per-file extraction of one queried measurement.

use std::path::Path;

use records_core::{Observation, ReferenceRange, SchemaError, StatInfo};
use serde_json::Value;

use crate::discovery::load_document;
use crate::normalize::{code_text, get_reference_range, json_kind, matches_category, resolve_values};
use crate::RecordError;

/// An extracted observation together with the lab's stated normal range.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub observation: Observation,
    pub reference_range: Option<ReferenceRange>,
}

/// Extracts the observation matching `query` from one file.
///
/// `Ok(None)` means the file is readable but does not hold a numeric value
/// for this category and code. The `referenceRange` field is not inspected.
pub fn extract_value(path: &Path, query: &StatInfo) -> Result<Option<Observation>, RecordError> {
    let document = load_document(path)?;
    extract_matching(path, &document, query)
}

/// Like [`extract_value`], also resolving the document's `referenceRange`.
pub fn extract_record(path: &Path, query: &StatInfo) -> Result<Option<ExtractedRecord>, RecordError> {
    let document = load_document(path)?;
    let Some(observation) = extract_matching(path, &document, query)? else {
        return Ok(None);
    };
    let reference_range = document
        .get("referenceRange")
        .map(get_reference_range)
        .transpose()
        .map_err(|source| RecordError::schema(path, source))?;
    Ok(Some(ExtractedRecord {
        observation,
        reference_range,
    }))
}

fn extract_matching(
    path: &Path,
    document: &Value,
    query: &StatInfo,
) -> Result<Option<Observation>, RecordError> {
    let observation =
        extract_from_document(document, query).map_err(|source| RecordError::schema(path, source))?;
    if observation.is_none() {
        tracing::trace!(path = %path.display(), query = %query, "No matching value");
    }
    Ok(observation)
}

/// Extraction over an already decoded document.
pub fn extract_from_document(
    document: &Value,
    query: &StatInfo,
) -> Result<Option<Observation>, SchemaError> {
    let categories = document
        .get("category")
        .ok_or_else(|| SchemaError::missing("category"))?;
    if !matches_category(categories, &query.category)? {
        return Ok(None);
    }
    if code_text(document)? != query.code {
        return Ok(None);
    }

    let Some(data) = resolve_values(document, &query.code)? else {
        return Ok(None);
    };

    let date = match document.get("effectiveDateTime") {
        Some(Value::String(date)) => date.clone(),
        Some(other) => {
            return Err(SchemaError::shape(
                "effectiveDateTime",
                "string",
                json_kind(other),
            ))
        }
        None => return Err(SchemaError::missing("effectiveDateTime")),
    };

    Ok(Some(Observation {
        name: query.code.clone(),
        date,
        data,
    }))
}
