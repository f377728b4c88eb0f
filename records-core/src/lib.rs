//! Canonical data model for values extracted from clinical-record exports.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod range_text;
pub mod units;

pub use range_text::{parse_range_text, NEG_INF, POS_INF};
pub use units::convert;

/// How a scan reacts to a file that cannot be read or normalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Skip the file, log it and report it in the scan result.
    #[default]
    Lenient,
    /// Abort the whole scan on the first failure.
    Strict,
}

/// Settings shared by every scan over a clinical-records directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Filename prefix of value-bearing documents.
    pub observation_prefix: String,
    /// Category used when a query names only a code.
    pub default_category: String,
    /// Medication request statuses treated as no longer active.
    pub inactive_medication_statuses: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Lenient,
            observation_prefix: "Observation".to_string(),
            default_category: "Vital Signs".to_string(),
            inactive_medication_statuses: vec!["completed".to_string(), "stopped".to_string()],
        }
    }
}

impl ScanConfig {
    pub fn is_strict(&self) -> bool {
        self.mode == ScanMode::Strict
    }
}

/// One measured quantity, already converted to display units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueQuantity {
    pub value: f64,
    pub unit: String,
    /// Component name ("Systolic blood pressure") or the queried code.
    pub name: String,
}

impl ValueQuantity {
    pub fn new(value: f64, unit: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            name: name.into(),
        }
    }
}

/// Query key selecting one kind of measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StatInfo {
    pub category: String,
    pub code: String,
}

impl StatInfo {
    pub fn new(category: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            code: code.into(),
        }
    }
}

impl FromStr for StatInfo {
    type Err = QueryParseError;

    /// Parses `"Category#Code"`, splitting at the first `#`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.split_once('#') {
            Some((category, code)) if !category.is_empty() && !code.is_empty() => {
                Ok(Self::new(category, code))
            }
            _ => Err(QueryParseError::MissingSeparator {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for StatInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category, self.code)
    }
}

/// Measurement(s) extracted from a single document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub name: String,
    /// `effectiveDateTime` exactly as it appears in the document.
    pub date: String,
    pub data: Vec<ValueQuantity>,
}

impl Observation {
    /// Parses `date` as RFC 3339.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

/// Parses a lower date bound given as `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_after_bound(input: &str) -> Result<DateTime<Utc>, QueryParseError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| QueryParseError::InvalidDate {
            input: input.to_string(),
        })
}

/// A lab's normal interval, either structured or as free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub low: Option<ValueQuantity>,
    pub high: Option<ValueQuantity>,
    pub text: String,
}

impl ReferenceRange {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            low: None,
            high: None,
            text: text.into(),
        }
    }

    /// Numeric bounds, open sides filled with [`NEG_INF`]/[`POS_INF`].
    ///
    /// Structured bounds win; the text is parsed only when neither bound is set.
    pub fn range(&self) -> Result<(f64, f64), RangeParseError> {
        match (&self.low, &self.high) {
            (Some(low), Some(high)) => Ok((low.value, high.value)),
            (Some(low), None) => Ok((low.value, POS_INF)),
            (None, Some(high)) => Ok((NEG_INF, high.value)),
            (None, None) => parse_range_text(&self.text),
        }
    }
}

/// Scale at which [`Tally::ranked`] compares accumulated weights.
pub const RANK_PRECISION: f64 = 1e6;

/// Weighted label counter that remembers first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &str, weight: f64) {
        match self.index.get(label) {
            Some(&slot) => self.entries[slot].1 += weight,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), weight));
            }
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        for (label, weight) in other.iter() {
            self.add(label, weight);
        }
    }

    /// Weight recorded for `label`, zero when never seen.
    pub fn get(&self, label: &str) -> f64 {
        self.index
            .get(label)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0.0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    /// Labels with their weights in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries
            .iter()
            .map(|(label, weight)| (label.as_str(), *weight))
    }

    /// Labels by descending weight; ties keep first-encounter order.
    ///
    /// Weights are compared at [`RANK_PRECISION`], so ten `0.1` additions
    /// tie with a single `1.0`.
    pub fn ranked(&self) -> Vec<String> {
        let rank = |weight: f64| (weight * RANK_PRECISION).round();
        let mut entries: Vec<&(String, f64)> = self.entries.iter().collect();
        entries.sort_by(|a, b| rank(b.1).total_cmp(&rank(a.1)));
        entries.into_iter().map(|(label, _)| label.clone()).collect()
    }
}

impl PartialEq for Tally {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// A document field is missing or has a shape outside the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },
    #[error("field `{field}` has unexpected shape: expected {expected}, found {found}")]
    UnexpectedShape {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl SchemaError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn shape(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedShape {
            field: field.into(),
            expected,
            found,
        }
    }
}

/// Reference-range text matches none of the recognized forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeParseError {
    #[error("unrecognized reference range text: {text:?}")]
    Unrecognized { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryParseError {
    #[error("expected `category#code`, received {input:?}")]
    MissingSeparator { input: String },
    #[error("expected YYYY-MM-DD or an RFC 3339 timestamp, received {input:?}")]
    InvalidDate { input: String },
}
