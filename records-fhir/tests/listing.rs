use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use records_core::ScanConfig;
use records_fhir::{list_conditions, list_medications, list_procedures, ConditionRecord, ProcedureRecord};
use serde_json::{json, Value};

fn write_record(dir: &Path, name: &str, document: &Value) {
    fs::write(dir.join(name), document.to_string()).expect("write record");
}

fn status(code: &str) -> Value {
    json!({ "coding": [{ "system": "http://terminology.hl7.org", "code": code }] })
}

fn medication(status: &str, authored_on: &str, display: &str) -> Value {
    json!({
        "resourceType": "MedicationRequest",
        "status": status,
        "authoredOn": authored_on,
        "medicationReference": { "display": display }
    })
}

#[test]
fn conditions_and_allergies_are_sorted_by_recorded_date() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_record(
        dir.path(),
        "Condition-1.json",
        &json!({
            "resourceType": "Condition",
            "recordedDate": "2021-04-02",
            "clinicalStatus": status("active"),
            "verificationStatus": status("confirmed"),
            "code": { "text": "Essential hypertension" }
        }),
    );
    write_record(
        dir.path(),
        "Condition-2.json",
        &json!({
            "resourceType": "Condition",
            "recordedDate": "2019-08-30",
            "clinicalStatus": status("resolved"),
            "verificationStatus": status("confirmed"),
            "code": { "text": "Acute bronchitis" }
        }),
    );
    write_record(
        dir.path(),
        "AllergyIntolerance-1.json",
        &json!({
            "resourceType": "AllergyIntolerance",
            "recordedDate": "2015-01-12",
            "clinicalStatus": status("active"),
            "verificationStatus": status("unconfirmed"),
            "code": { "text": "Penicillins" }
        }),
    );

    let config = ScanConfig::default();
    let conditions = list_conditions(dir.path(), "Condition", &config).expect("conditions");
    let codes: Vec<&str> = conditions.records.iter().map(|record| record.code.as_str()).collect();
    assert_eq!(codes, vec!["Acute bronchitis", "Essential hypertension"]);

    let allergies = list_conditions(dir.path(), "AllergyIntolerance", &config).expect("allergies");
    assert_eq!(
        allergies.records,
        vec![ConditionRecord {
            resource_type: "AllergyIntolerance".to_string(),
            recorded_date: "2015-01-12".to_string(),
            clinical_status: "active".to_string(),
            verification_status: "unconfirmed".to_string(),
            code: "Penicillins".to_string(),
        }]
    );
}

#[test]
fn condition_without_status_is_skipped() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_record(
        dir.path(),
        "Condition-1.json",
        &json!({
            "resourceType": "Condition",
            "recordedDate": "2021-04-02",
            "code": { "text": "Essential hypertension" }
        }),
    );

    let listing = list_conditions(dir.path(), "Condition", &ScanConfig::default()).expect("lenient");
    assert!(listing.records.is_empty());
    assert_eq!(listing.skipped.len(), 1);
    assert!(listing.skipped[0].reason.contains("clinicalStatus.coding.0.code"));
}

#[test]
fn procedures_are_sorted_by_performed_date() {
    let dir = tempfile::tempdir().expect("temp dir");
    for (name, performed, code) in [
        ("Procedure-1.json", "2020-05-05T10:00:00Z", "Colonoscopy"),
        ("Procedure-2.json", "2018-02-11T09:30:00Z", "Appendectomy"),
    ] {
        write_record(
            dir.path(),
            name,
            &json!({
                "resourceType": "Procedure",
                "status": "completed",
                "performedDateTime": performed,
                "code": { "text": code }
            }),
        );
    }

    let listing = list_procedures(dir.path(), &ScanConfig::default()).expect("procedures");
    assert_eq!(
        listing.records.first(),
        Some(&ProcedureRecord {
            resource_type: "Procedure".to_string(),
            performed: "2018-02-11T09:30:00Z".to_string(),
            status: "completed".to_string(),
            code: "Appendectomy".to_string(),
        })
    );
    assert_eq!(listing.records.len(), 2);
}

#[test]
fn inactive_medications_are_listed_only_on_request() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_record(dir.path(), "MedicationRequest-1.json", &medication("active", "2023-06-14", "lisinopril 10 MG tablet"));
    write_record(dir.path(), "MedicationRequest-2.json", &medication("stopped", "2020-01-03", "atorvastatin 20 MG tablet"));
    write_record(dir.path(), "MedicationRequest-3.json", &medication("completed", "2021-09-09T14:00:00Z", "amoxicillin 500 MG capsule"));
    write_record(
        dir.path(),
        "MedicationRequest-4.json",
        &json!({
            "resourceType": "MedicationRequest",
            "status": "on-hold",
            "authoredOn": "2022-02-02",
            "medicationCodeableConcept": { "text": "metformin 500 MG tablet" }
        }),
    );

    let config = ScanConfig::default();
    let active = list_medications(dir.path(), false, &config).expect("active");
    let names: Vec<&str> = active.records.iter().map(|record| record.medication.as_str()).collect();
    assert_eq!(names, vec!["metformin 500 MG tablet", "lisinopril 10 MG tablet"]);
    assert!(active.records.iter().all(|record| record.active));

    let all = list_medications(dir.path(), true, &config).expect("all");
    let dates: Vec<&str> = all.records.iter().map(|record| record.authored_on.as_str()).collect();
    assert_eq!(dates, vec!["2020-01-03", "2021-09-09T14:00:00Z", "2022-02-02", "2023-06-14"]);
    assert_eq!(all.records.iter().filter(|record| !record.active).count(), 2);
}
