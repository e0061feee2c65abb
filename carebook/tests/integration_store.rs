//! Integration tests for record stores and the store registry.
//!
//! These tests go through the public API only: shared handles from the
//! registry, typed tables, and the on-disk format other tools read.

use std::fs;
use std::rc::Rc;

use carebook::model::{Measurement, Medication, MedicalProfile};
use carebook::record::{Field, Row};
use carebook::registry::StoreRegistry;
use carebook::store::{RecordStore, Table};
use serde_json::json;
use tempfile::tempdir;

const MEASUREMENT_SCHEMA: &[&str] = &["user_id", "constant", "value", "timestamp"];

fn measurement_row(value: &str) -> Row {
    Row::new()
        .with("user_id", "1")
        .with("constant", "heart_rate")
        .with("value", value)
        .with("timestamp", "T1")
}

#[test]
fn test_merge_is_idempotent() {
    let temp_dir = tempdir().unwrap();
    let store = RecordStore::open(temp_dir.path().join("measurements.csv"));

    let rows = vec![measurement_row("75"), measurement_row("80")];
    store.write(MEASUREMENT_SCHEMA, &rows).unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    // Writing the same rows again, in any order, changes nothing.
    store
        .write(MEASUREMENT_SCHEMA, &[rows[1].clone(), rows[0].clone()])
        .unwrap();
    let after = fs::read_to_string(store.path()).unwrap();

    assert_eq!(before, after);
    assert_eq!(store.read().unwrap().len(), 2);
}

#[test]
fn test_measurement_reads_back_as_number() {
    let temp_dir = tempdir().unwrap();
    let registry = StoreRegistry::new();
    let table: Table<Measurement> = registry.table(temp_dir.path().join("measurements.csv"));

    table
        .append(&[Measurement::new("1", "heart_rate", 75.0, "T1")])
        .unwrap();

    let stored = table.all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id, "1");
    assert_eq!(stored[0].timestamp, "T1");
    assert!((stored[0].value - 75.0).abs() < f64::EPSILON);
}

#[test]
fn test_registry_shares_one_store_per_path() {
    let temp_dir = tempdir().unwrap();
    let registry = StoreRegistry::new();
    let path = temp_dir.path().join("measurements.csv");

    let writer = registry.get_or_create(&path);
    let reader = registry.get_or_create(temp_dir.path().join(".").join("measurements.csv"));
    assert!(Rc::ptr_eq(&writer, &reader));
    assert_eq!(registry.len(), 1);

    writer
        .write(MEASUREMENT_SCHEMA, &[measurement_row("75")])
        .unwrap();
    assert_eq!(reader.read().unwrap().len(), 1);

    // A second registry is an independent cache over the same file.
    let other = StoreRegistry::new().get_or_create(&path);
    assert!(!Rc::ptr_eq(&writer, &other));
    assert_eq!(other.read().unwrap().len(), 1);
}

#[test]
fn test_file_format_quotes_and_nested_values() {
    let temp_dir = tempdir().unwrap();
    let registry = StoreRegistry::new();
    let path = temp_dir.path().join("profiles.csv");
    let table: Table<MedicalProfile> = registry.table(&path);

    let profile = MedicalProfile {
        user_id: "1".to_string(),
        address: "Carrer Major, 3\n2n 1a".to_string(),
        medical_comment: Some("says \"fine\"".to_string()),
        medications: vec![Medication {
            name: "Sintrom".to_string(),
            duration: "indefinite".to_string(),
        }],
        ..MedicalProfile::default()
    };
    table.update(&profile).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(
        header,
        "user_id,birth_date,gender,blood_group,allergies,address,phone,medical_comment,medications"
    );
    assert!(text.contains("\"Carrer Major, 3\n2n 1a\""));
    assert!(text.contains("\"says \"\"fine\"\"\""));
    assert!(text.contains(r#""[{""duration"":""indefinite"",""name"":""Sintrom""}]""#));

    let rows = registry.get_or_create(&path).read().unwrap();
    assert_eq!(
        rows[0].get("medications"),
        Some(&Field::Structured(json!([{"name": "Sintrom", "duration": "indefinite"}])))
    );
    assert_eq!(table.all().unwrap(), vec![profile]);
}

#[test]
fn test_update_replaces_by_key() {
    let temp_dir = tempdir().unwrap();
    let registry = StoreRegistry::new();
    let table: Table<MedicalProfile> = registry.table(temp_dir.path().join("profiles.csv"));

    let mut profile = MedicalProfile {
        user_id: "1".to_string(),
        blood_group: "0-".to_string(),
        ..MedicalProfile::default()
    };
    table.update(&profile).unwrap();

    profile.allergies = true;
    let summary = table.update(&profile).unwrap();

    assert_eq!(summary.replaced, 1);
    assert_eq!(table.all().unwrap(), vec![profile]);
}

#[test]
fn test_legacy_file_is_readable() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("measurements.csv");
    fs::write(
        &path,
        "user_id,constant,value,timestamp\r\n\
         1,heart_rate,72.0,2024-12-10T10:00:00.123456\r\n\
         \r\n\
         1,spo2,97,2024-12-10T10:05:00\r\n",
    )
    .unwrap();

    let registry = StoreRegistry::new();
    let table: Table<Measurement> = registry.table(&path);
    let stored = table.all().unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].constant, "spo2");

    // Rewriting keeps the rows and normalizes line endings.
    table.append(&[]).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains('\r'));
    assert_eq!(table.count().unwrap(), 2);
}
