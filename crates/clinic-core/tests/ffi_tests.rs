//! Tests for the FFI-facing `ClinicCore` object.

use clinic_core::models::current_date;
use clinic_core::{
    open_database, open_database_from_config_file, open_database_in_memory,
    open_database_with_config, ClinicError, FfiPatientForm, FfiStatusUpdate, Patient,
};

fn form(name: &str, birthday: &str) -> FfiPatientForm {
    FfiPatientForm {
        name: name.to_string(),
        birthday: birthday.to_string(),
        city: Some("Jinotega".to_string()),
        sex: None,
        phone: None,
    }
}

#[test]
fn test_create_and_select_rows() {
    let core = open_database_in_memory().unwrap();

    let patient = core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap();
    assert_eq!(patient.key.len(), 64);
    assert!(!patient.need_to_upload);

    let rows = core.get_patient_select_rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Maria Lopez");
    assert_eq!(rows[0].patient_key, patient.key);
}

#[test]
fn test_duplicate_create_returns_flagged_attempt() {
    let core = open_database_in_memory().unwrap();
    core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap();

    match core.create_patient(form("Maria Lopez", "1990-04-12")) {
        Err(ClinicError::DuplicateKey(json)) => {
            let attempted: Patient = serde_json::from_str(&json).unwrap();
            assert!(attempted.need_to_upload);
            assert_eq!(attempted.name, "Maria Lopez");
        }
        other => panic!("expected DuplicateKey, got {:?}", other.map(|p| p.key)),
    }
}

#[test]
fn test_signin_errors() {
    let core = open_database_in_memory().unwrap();

    assert!(matches!(
        core.signin_patient(form("Nobody", "2000-01-01")),
        Err(ClinicError::NotFound(_))
    ));

    core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap();
    assert!(matches!(
        core.signin_patient(form("Maria Lopez", "1990-04-12")),
        Err(ClinicError::DuplicateCheckin(_))
    ));
}

#[test]
fn test_status_and_notes_round_trip() {
    let core = open_database_in_memory().unwrap();
    let patient = core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap();
    let today = current_date();

    core.update_status(
        patient.key.clone(),
        today.clone(),
        FfiStatusUpdate::DoctorCompleted { value: true },
    )
    .unwrap();
    assert!(core.get_patient_select_rows().unwrap()[0].doctor_completed);

    let soap_json = format!(
        r#"{{"patientKey":"{}","date":"2000-01-01","plan":"hydrate"}}"#,
        patient.key
    );
    core.update_soap(soap_json).unwrap();
    let soap = core.get_soap(patient.key.clone(), today).unwrap().unwrap();
    assert!(soap.contains("hydrate"));

    assert!(core
        .get_triage(patient.key.clone(), "1999-01-01".to_string())
        .unwrap()
        .is_none());
}

#[test]
fn test_merge_and_sync_bookkeeping() {
    let core = open_database_in_memory().unwrap();
    let patient = core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap();
    assert_eq!(core.last_synced().unwrap(), 0);

    let batch = format!(
        r#"[{{"key":"{key}","name":"Maria Lopez","birthday":"1990-04-12","lastUpdated":{ts},
            "medications":[{{"patientKey":"{key}","date":"2024-01-01","name":"aspirin","lastUpdated":1}}]}},
           {{"key":"unknown","name":"X","birthday":"Y","lastUpdated":1}}]"#,
        key = patient.key,
        ts = patient.last_updated + 1
    );
    let report = core.merge_snapshots(batch).unwrap();

    assert_eq!(report.accepted, vec![patient.key.clone()]);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].patient_key, "unknown");
    assert_eq!(core.last_synced().unwrap(), report.last_synced);

    let orders = core.get_medication_updates(patient.key.clone()).unwrap();
    assert!(orders.contains("aspirin"));
}

#[test]
fn test_upload_queue() {
    let core = open_database_in_memory().unwrap();
    assert_eq!(core.get_updates_to_upload().unwrap(), "[]");
    assert_eq!(core.mark_uploaded(vec!["missing".to_string()]).unwrap(), 0);
}

#[test]
fn test_file_database_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db").to_string_lossy().to_string();

    let key = {
        let core = open_database(path.clone()).unwrap();
        core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap().key
    };

    let core = open_database(path).unwrap();
    assert!(core.get_patient(key).unwrap().is_some());
}

#[test]
fn test_bad_snapshot_reported_alongside_good_ones() {
    let core = open_database_in_memory().unwrap();
    let patient = core.create_patient(form("Maria Lopez", "1990-04-12")).unwrap();

    let batch = format!(
        r#"[{{"name":"missing key"}},
           {{"key":"{key}","name":"Maria Lopez","birthday":"1990-04-12","lastUpdated":{ts}}}]"#,
        key = patient.key,
        ts = patient.last_updated + 1
    );
    let report = core.merge_snapshots(batch).unwrap();

    assert_eq!(report.accepted, vec![patient.key]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].patient_key, "#0");
    assert!(report.failed[0].message.contains("position 0"));
    assert_eq!(core.last_synced().unwrap(), report.last_synced);

    assert!(matches!(
        core.merge_snapshots("not json".to_string()),
        Err(ClinicError::SerializationError(_))
    ));
}

// Only test in this binary that touches CLINIC_* variables.
#[test]
fn test_config_entry_points_honor_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let configured = dir.path().join("configured.db");
    let overridden = dir.path().join("overridden.db");
    let config_json = format!(
        r#"{{"databasePath":{},"busyTimeoutMs":250}}"#,
        serde_json::to_string(&configured).unwrap()
    );
    let config_file = dir.path().join("store.json");
    std::fs::write(&config_file, &config_json).unwrap();

    std::env::set_var("CLINIC_DATABASE_PATH", &overridden);
    let key = open_database_with_config(config_json.clone())
        .unwrap()
        .create_patient(form("Maria Lopez", "1990-04-12"))
        .unwrap()
        .key;
    let from_file =
        open_database_from_config_file(config_file.to_string_lossy().to_string()).unwrap();
    assert!(from_file.get_patient(key.clone()).unwrap().is_some());
    std::env::remove_var("CLINIC_DATABASE_PATH");

    assert!(overridden.exists());
    assert!(!configured.exists());

    let without_override = open_database_with_config(config_json).unwrap();
    assert!(without_override.get_patient(key).unwrap().is_none());
}
