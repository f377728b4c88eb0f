use std::fs;
use std::path::{Path, PathBuf};

use records_core::{parse_after_bound, ScanConfig, ScanMode, StatInfo};
use records_fhir::{extract_all_values, observation_files, RecordError};
use serde_json::json;

fn write_weight(dir: &Path, name: &str, date: &str, kilograms: f64) -> PathBuf {
    let path = dir.join(name);
    let document = json!({
        "resourceType": "Observation",
        "category": [{ "text": "Vital Signs" }],
        "code": { "text": "Weight" },
        "effectiveDateTime": date,
        "valueQuantity": { "value": kilograms, "unit": "kg" }
    });
    fs::write(&path, document.to_string()).expect("write record");
    path
}

fn weight() -> StatInfo {
    StatInfo::new("Vital Signs", "Weight")
}

fn dates(series: &records_fhir::Series) -> Vec<&str> {
    series
        .observations
        .iter()
        .map(|observation| observation.date.as_str())
        .collect()
}

#[test]
fn output_is_sorted_by_date_for_any_file_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let files = vec![
        write_weight(dir.path(), "Observation-a.json", "2024-03-01T08:00:00Z", 80.0),
        write_weight(dir.path(), "Observation-b.json", "2022-11-20T08:00:00Z", 82.0),
        write_weight(dir.path(), "Observation-c.json", "2023-06-15T08:00:00Z", 81.0),
    ];
    let expected = vec![
        "2022-11-20T08:00:00Z",
        "2023-06-15T08:00:00Z",
        "2024-03-01T08:00:00Z",
    ];

    let config = ScanConfig::default();
    let forward = extract_all_values(&files, &weight(), None, &config).expect("forward");
    let backward = extract_all_values(files.iter().rev(), &weight(), None, &config).expect("backward");

    assert_eq!(dates(&forward), expected);
    assert_eq!(dates(&backward), expected);
    assert_eq!(forward.width(), Some(1));
    assert!(forward.is_homogeneous());
}

#[test]
fn non_matching_files_are_left_out() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_weight(dir.path(), "Observation-a.json", "2024-03-01T08:00:00Z", 80.0);
    let pulse = dir.path().join("Observation-pulse.json");
    fs::write(
        &pulse,
        json!({
            "category": [{ "text": "Vital Signs" }],
            "code": { "text": "Pulse" },
            "effectiveDateTime": "2024-03-01T08:00:00Z",
            "valueQuantity": { "value": 64, "unit": "/min" }
        })
        .to_string(),
    )
    .expect("write pulse");

    let config = ScanConfig::default();
    let files = observation_files(dir.path(), &config).expect("files");
    let series = extract_all_values(&files, &weight(), None, &config).expect("series");
    assert_eq!(series.observations.len(), 1);
    assert_eq!(series.query, weight());
    assert!(series.skipped.is_empty());
}

#[test]
fn after_bound_is_strict() {
    let dir = tempfile::tempdir().expect("temp dir");
    let files = vec![
        write_weight(dir.path(), "Observation-a.json", "2024-02-15T00:00:00Z", 80.0),
        write_weight(dir.path(), "Observation-b.json", "2024-02-15T21:00:03Z", 81.0),
        write_weight(dir.path(), "Observation-c.json", "2024-02-14T23:59:59Z", 79.0),
    ];
    let config = ScanConfig::default();

    let after_day = parse_after_bound("2024-02-15").expect("bound");
    let series = extract_all_values(&files, &weight(), Some(after_day), &config).expect("series");
    assert_eq!(dates(&series), vec!["2024-02-15T21:00:03Z"]);

    let after_instant = parse_after_bound("2024-02-15T21:00:03Z").expect("bound");
    let series = extract_all_values(&files, &weight(), Some(after_instant), &config).expect("series");
    assert!(series.observations.is_empty());
}

#[test]
fn unreadable_files_are_reported_separately_from_empty_results() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_weight(dir.path(), "Observation-a.json", "2024-03-01T08:00:00Z", 80.0);
    fs::write(dir.path().join("Observation-broken.json"), "{").expect("write broken");

    let mut config = ScanConfig::default();
    let files = observation_files(dir.path(), &config).expect("files");

    let series = extract_all_values(&files, &weight(), None, &config).expect("lenient");
    assert_eq!(series.observations.len(), 1);
    assert_eq!(series.skipped.len(), 1);
    assert!(series.skipped[0].path.ends_with("Observation-broken.json"));

    config.mode = ScanMode::Strict;
    let strict = extract_all_values(&files, &weight(), None, &config);
    assert!(matches!(strict, Err(RecordError::Json { .. })));
}

#[test]
fn mixed_component_layouts_are_not_homogeneous() {
    let dir = tempfile::tempdir().expect("temp dir");
    let single = dir.path().join("Observation-single.json");
    let pair = dir.path().join("Observation-pair.json");
    fs::write(
        &single,
        json!({
            "category": [{ "text": "Vital Signs" }],
            "code": { "text": "Blood Pressure" },
            "effectiveDateTime": "2021-01-01T08:00:00Z",
            "valueQuantity": { "value": 120, "unit": "mm[Hg]" }
        })
        .to_string(),
    )
    .expect("write single");
    fs::write(
        &pair,
        json!({
            "category": [{ "text": "Vital Signs" }],
            "code": { "text": "Blood Pressure" },
            "effectiveDateTime": "2022-01-01T08:00:00Z",
            "component": [
                { "code": { "text": "Systolic blood pressure" }, "valueQuantity": { "value": 121, "unit": "mm[Hg]" } },
                { "code": { "text": "Diastolic blood pressure" }, "valueQuantity": { "value": 79, "unit": "mm[Hg]" } }
            ]
        })
        .to_string(),
    )
    .expect("write pair");

    let series = extract_all_values(
        [&single, &pair],
        &StatInfo::new("Vital Signs", "Blood Pressure"),
        None,
        &ScanConfig::default(),
    )
    .expect("series");
    assert_eq!(series.width(), Some(1));
    assert!(!series.is_homogeneous());
}

#[test]
fn after_bound_drops_dates_it_cannot_parse() {
    let dir = tempfile::tempdir().expect("temp dir");
    let files = vec![
        write_weight(dir.path(), "Observation-a.json", "2024-03-01T08:00:00Z", 80.0),
        write_weight(dir.path(), "Observation-b.json", "2024-02-15", 81.0),
    ];
    let config = ScanConfig::default();

    let unfiltered = extract_all_values(&files, &weight(), None, &config).expect("series");
    assert_eq!(dates(&unfiltered), vec!["2024-02-15", "2024-03-01T08:00:00Z"]);

    let bound = parse_after_bound("2024-01-01").expect("bound");
    let filtered = extract_all_values(&files, &weight(), Some(bound), &config).expect("series");
    assert_eq!(dates(&filtered), vec!["2024-03-01T08:00:00Z"]);
    assert!(filtered.skipped.is_empty());
}
