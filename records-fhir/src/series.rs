//! Date-ordered series of one measurement across many files.

use std::path::Path;

use chrono::{DateTime, Utc};
use records_core::{Observation, ScanConfig, StatInfo};

use crate::extract::extract_value;
use crate::{RecordError, SkipLog, SkippedFile};

/// Every observation found for one query, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub query: StatInfo,
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedFile>,
}

impl Series {
    /// Number of values per observation, taken from the first one.
    pub fn width(&self) -> Option<usize> {
        self.observations.first().map(|observation| observation.data.len())
    }

    /// True when every observation carries the same component names in the
    /// same order. Extraction does not enforce this.
    pub fn is_homogeneous(&self) -> bool {
        let Some(first) = self.observations.first() else {
            return true;
        };
        self.observations.iter().all(|observation| {
            observation.data.len() == first.data.len()
                && observation
                    .data
                    .iter()
                    .zip(&first.data)
                    .all(|(value, reference)| value.name == reference.name)
        })
    }
}

/// Extracts `query` from every file and sorts the results by date.
///
/// Dates are compared as strings, which is chronological for the fixed-width
/// `YYYY-MM-DDTHH:MM:SSZ` format; the sort is stable. With `after`, only
/// observations strictly later than the bound are kept.
pub fn extract_all_values<I, P>(
    files: I,
    query: &StatInfo,
    after: Option<DateTime<Utc>>,
    config: &ScanConfig,
) -> Result<Series, RecordError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut skips = SkipLog::new(config);
    let mut observations = Vec::new();

    for file in files {
        if let Some(Some(observation)) = skips.absorb(extract_value(file.as_ref(), query))? {
            observations.push(observation);
        }
    }

    observations.sort_by(|a, b| a.date.cmp(&b.date));

    if let Some(bound) = after {
        observations.retain(|observation| match observation.timestamp() {
            Some(timestamp) => timestamp > bound,
            None => {
                tracing::warn!(date = %observation.date, "Dropping observation with unparsable date");
                false
            }
        });
    }

    tracing::debug!(query = %query, found = observations.len(), "Assembled series");
    Ok(Series {
        query: query.clone(),
        observations,
        skipped: skips.into_skipped(),
    })
}
