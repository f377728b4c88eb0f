//! Flat listings of conditions, allergies, procedures and medications.

use std::path::Path;

use records_core::{ScanConfig, SchemaError};
use serde::Serialize;
use serde_json::Value;

use crate::discovery::{list_json_files, load_document};
use crate::normalize::json_kind;
use crate::{RecordError, SkipLog, SkippedFile};

/// Records of one resource kind, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedFile>,
}

/// A `Condition` or `AllergyIntolerance` entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConditionRecord {
    pub resource_type: String,
    pub recorded_date: String,
    pub clinical_status: String,
    pub verification_status: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProcedureRecord {
    pub resource_type: String,
    pub performed: String,
    pub status: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MedicationRecord {
    pub resource_type: String,
    pub authored_on: String,
    pub status: String,
    pub medication: String,
    pub active: bool,
}

/// Lists condition-like records from files starting with `prefix`
/// (`"Condition"` or `"AllergyIntolerance"`).
pub fn list_conditions(
    dir: &Path,
    prefix: &str,
    config: &ScanConfig,
) -> Result<Listing<ConditionRecord>, RecordError> {
    let mut listing = collect(dir, prefix, config, |document| {
        Ok(Some(ConditionRecord {
            resource_type: text_at(document, "/resourceType")?,
            recorded_date: text_at(document, "/recordedDate")?,
            clinical_status: text_at(document, "/clinicalStatus/coding/0/code")?,
            verification_status: text_at(document, "/verificationStatus/coding/0/code")?,
            code: text_at(document, "/code/text")?,
        }))
    })?;
    listing
        .records
        .sort_by(|a, b| a.recorded_date.cmp(&b.recorded_date));
    Ok(listing)
}

pub fn list_procedures(
    dir: &Path,
    config: &ScanConfig,
) -> Result<Listing<ProcedureRecord>, RecordError> {
    let mut listing = collect(dir, "Procedure", config, |document| {
        Ok(Some(ProcedureRecord {
            resource_type: text_at(document, "/resourceType")?,
            performed: text_at(document, "/performedDateTime")?,
            status: text_at(document, "/status")?,
            code: text_at(document, "/code/text")?,
        }))
    })?;
    listing.records.sort_by(|a, b| a.performed.cmp(&b.performed));
    Ok(listing)
}

/// Lists medication requests; inactive ones only when `include_inactive`.
pub fn list_medications(
    dir: &Path,
    include_inactive: bool,
    config: &ScanConfig,
) -> Result<Listing<MedicationRecord>, RecordError> {
    let mut listing = collect(dir, "MedicationRequest", config, |document| {
        let status = text_at(document, "/status")?;
        let active = !config
            .inactive_medication_statuses
            .iter()
            .any(|inactive| *inactive == status);
        if !active && !include_inactive {
            return Ok(None);
        }

        let medication = match text_at(document, "/medicationReference/display") {
            Err(SchemaError::MissingField { .. }) => {
                text_at(document, "/medicationCodeableConcept/text")?
            }
            other => other?,
        };

        Ok(Some(MedicationRecord {
            resource_type: text_at(document, "/resourceType")?,
            authored_on: text_at(document, "/authoredOn")?,
            status,
            medication,
            active,
        }))
    })?;
    listing
        .records
        .sort_by(|a, b| a.authored_on.cmp(&b.authored_on));
    Ok(listing)
}

fn collect<T, F>(
    dir: &Path,
    prefix: &str,
    config: &ScanConfig,
    read: F,
) -> Result<Listing<T>, RecordError>
where
    F: Fn(&Value) -> Result<Option<T>, SchemaError>,
{
    let mut skips = SkipLog::new(config);
    let mut records = Vec::new();

    for path in list_json_files(dir, Some(prefix))? {
        let result = load_document(&path)
            .and_then(|document| read(&document).map_err(|source| RecordError::schema(&path, source)));
        if let Some(Some(record)) = skips.absorb(result)? {
            records.push(record);
        }
    }

    tracing::debug!(prefix, records = records.len(), "Listed records");
    Ok(Listing {
        records,
        skipped: skips.into_skipped(),
    })
}

/// String at a JSON pointer, reported as a dotted field path on failure.
fn text_at(document: &Value, pointer: &str) -> Result<String, SchemaError> {
    let field = pointer.trim_start_matches('/').replace('/', ".");
    match document.pointer(pointer) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(SchemaError::shape(field, "string", json_kind(other))),
        None => Err(SchemaError::missing(field)),
    }
}
