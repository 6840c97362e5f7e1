//! Merge engine integration tests.

use clinic_core::db::{self, Database, RecordTable};
use clinic_core::merge::{MergeEngine, MergeError};
use clinic_core::models::{DrugKey, DrugUpdate, Patient, Soap, Status, VisitKey};
use clinic_core::store::LocalStore;
use clinic_core::sync::SyncBookkeeping;

fn seed_patient(db: &Database, name: &str, last_updated: i64) -> Patient {
    let mut patient = Patient::new(name, "1990-04-12");
    patient.last_updated = last_updated;
    db::insert_patient(db.conn(), &patient).unwrap();
    patient
}

fn seed_soap(db: &Database, patient: &Patient, date: &str, last_updated: i64) -> Soap {
    let mut soap = Soap::new(&patient.key, date);
    soap.subjective = Some("local subjective".to_string());
    soap.plan = Some("local plan".to_string());
    soap.last_updated = last_updated;
    soap.insert(db.conn()).unwrap();
    soap
}

fn snapshot_of(patient: &Patient, last_updated: i64) -> Patient {
    let mut snapshot = patient.without_records();
    snapshot.last_updated = last_updated;
    snapshot
}

fn stored(db: &Database, key: &str) -> Patient {
    db::find_patient(db.conn(), key).unwrap().unwrap()
}

#[test]
fn test_stale_snapshot_rejected_even_with_newer_records() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 100);
    let local_soap = seed_soap(&db, &patient, "2024-01-01", 50);

    let mut snapshot = snapshot_of(&patient, 100);
    let mut newer = Soap::new(&patient.key, "2024-01-01");
    newer.plan = Some("server plan".to_string());
    newer.last_updated = 200;
    snapshot.soaps.push(newer);
    snapshot
        .medications
        .push(DrugUpdate::new(&patient.key, "2024-01-01", "aspirin"));

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();

    assert_eq!(report.stale, vec![patient.key.clone()]);
    assert!(report.accepted.is_empty());
    assert_eq!(report.records.changed(), 0);

    let after = stored(&db, &patient.key);
    assert_eq!(after.soaps, vec![local_soap]);
    assert!(after.medications.is_empty());
    assert_eq!(after.last_updated, 100);
}

#[test]
fn test_older_snapshot_rejected() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 100);

    let mut snapshot = snapshot_of(&patient, 99);
    snapshot.soaps.push(Soap::new(&patient.key, "2024-01-01"));

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.stale.len(), 1);
    assert!(stored(&db, &patient.key).soaps.is_empty());
}

#[test]
fn test_new_drug_update_is_appended() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 10);
    let local_soap = seed_soap(&db, &patient, "2023-12-31", 5);
    let mut existing_order = DrugUpdate::new(&patient.key, "2024-01-01", "ibuprofen");
    existing_order.last_updated = 5;
    existing_order.insert(db.conn()).unwrap();

    let mut snapshot = snapshot_of(&patient, 20);
    let mut aspirin = DrugUpdate::new(&patient.key, "2024-01-01", "aspirin");
    aspirin.dose = Some("81mg".to_string());
    aspirin.last_updated = 15;
    snapshot.medications.push(aspirin.clone());

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.inserted, 1);
    assert_eq!(report.records.overwritten, 0);

    let after = stored(&db, &patient.key);
    assert_eq!(after.medications, vec![existing_order, aspirin]);
    assert_eq!(after.soaps, vec![local_soap]);
    assert_eq!(
        DrugUpdate::find(db.conn(), &DrugKey::new(&patient.key, "2024-01-01", "aspirin"))
            .unwrap()
            .unwrap()
            .dose
            .as_deref(),
        Some("81mg")
    );
}

#[test]
fn test_newer_record_overwrites_in_full() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 50);
    seed_soap(&db, &patient, "2024-01-01", 50);

    let mut snapshot = snapshot_of(&patient, 51);
    let mut incoming = Soap::new(&patient.key, "2024-01-01");
    incoming.assessment = Some("server assessment".to_string());
    incoming.last_updated = 60;
    snapshot.soaps.push(incoming.clone());

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.overwritten, 1);

    let soap = Soap::find(db.conn(), &VisitKey::new(&patient.key, "2024-01-01"))
        .unwrap()
        .unwrap();
    // Whole-record copy: fields absent remotely are cleared locally too
    assert_eq!(soap, incoming);
    assert_eq!(soap.subjective, None);
    assert_eq!(soap.last_updated, 60);
    assert_eq!(stored(&db, &patient.key).last_updated, 51);
}

#[test]
fn test_newer_status_overwrites_visit() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 50);
    Status::check_in(&patient, "2024-01-01", 40)
        .insert(db.conn())
        .unwrap();

    let mut incoming = Status::check_in(&patient, "2024-01-01", 40);
    incoming.doctor_completed = true;
    incoming.notes = Some("seen by Dr. Ortiz".to_string());
    incoming.last_updated = 60;
    let mut snapshot = snapshot_of(&patient, 61);
    snapshot.statuses.push(incoming.clone());

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.overwritten, 1);

    let stored = Status::find(db.conn(), &VisitKey::new(&patient.key, "2024-01-01"))
        .unwrap()
        .unwrap();
    assert_eq!(stored, incoming);
}

#[test]
fn test_newer_triage_overwrites_vitals() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 50);
    let mut local = clinic_core::Triage::new(&patient.key, "2024-01-01");
    local.temperature = Some(37.0);
    local.pulse = Some(80);
    local.last_updated = 45;
    local.insert(db.conn()).unwrap();

    let mut incoming = clinic_core::Triage::new(&patient.key, "2024-01-01");
    incoming.temperature = Some(38.5);
    incoming.labs_done = true;
    incoming.last_updated = 55;
    let mut snapshot = snapshot_of(&patient, 56);
    snapshot.triages.push(incoming.clone());

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.overwritten, 1);

    let stored = clinic_core::Triage::find(db.conn(), &VisitKey::new(&patient.key, "2024-01-01"))
        .unwrap()
        .unwrap();
    assert_eq!(stored, incoming);
    assert_eq!(stored.pulse, None);
}

#[test]
fn test_newer_drug_update_overwrites_order() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 50);
    let mut local = DrugUpdate::new(&patient.key, "2024-01-01", "amoxicillin");
    local.dose = Some("250mg".to_string());
    local.notes = Some("with food".to_string());
    local.last_updated = 30;
    local.insert(db.conn()).unwrap();

    let mut incoming = DrugUpdate::new(&patient.key, "2024-01-01", "amoxicillin");
    incoming.dose = Some("500mg".to_string());
    incoming.frequency = Some("bid".to_string());
    incoming.last_updated = 70;
    let mut snapshot = snapshot_of(&patient, 71);
    snapshot.medications.push(incoming.clone());

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.overwritten, 1);

    let stored = DrugUpdate::find(
        db.conn(),
        &DrugKey::new(&patient.key, "2024-01-01", "amoxicillin"),
    )
    .unwrap()
    .unwrap();
    assert_eq!(stored, incoming);
    assert_eq!(stored.notes, None);
}

#[test]
fn test_local_record_kept_on_tie_or_older() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 50);
    let tie = seed_soap(&db, &patient, "2024-01-01", 50);
    let newer_local = seed_soap(&db, &patient, "2024-01-02", 70);

    let mut snapshot = snapshot_of(&patient, 80);
    let mut same_time = Soap::new(&patient.key, "2024-01-01");
    same_time.plan = Some("server".to_string());
    same_time.last_updated = 50;
    let mut older = Soap::new(&patient.key, "2024-01-02");
    older.plan = Some("server".to_string());
    older.last_updated = 60;
    snapshot.soaps.extend([same_time, older]);

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.unchanged, 2);

    let after = stored(&db, &patient.key);
    assert_eq!(after.soaps, vec![tie, newer_local]);
    assert_eq!(after.last_updated, 80);
}

#[test]
fn test_all_four_collections_merged() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 10);

    let mut snapshot = snapshot_of(&patient, 20);
    let mut soap = Soap::new(&patient.key, "2024-01-01");
    soap.last_updated = 11;
    let mut triage = clinic_core::Triage::new(&patient.key, "2024-01-01");
    triage.last_updated = 12;
    let mut order = DrugUpdate::new(&patient.key, "2024-01-01", "aspirin");
    order.last_updated = 13;
    let status = Status::check_in(&patient, "2024-01-01", 14);
    snapshot.soaps.push(soap);
    snapshot.triages.push(triage);
    snapshot.medications.push(order);
    snapshot.statuses.push(status);

    let report = MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.records.inserted, 4);

    let after = stored(&db, &patient.key);
    assert_eq!(after.record_count(), 4);
    assert!(after.statuses.iter().all(|s| s.last_updated <= after.last_updated));
}

#[test]
fn test_replaying_batch_is_noop() {
    let db = Database::open_in_memory().unwrap();
    let patient = seed_patient(&db, "Maria Lopez", 10);
    seed_soap(&db, &patient, "2024-01-01", 5);

    let mut snapshot = snapshot_of(&patient, 30);
    let mut soap = Soap::new(&patient.key, "2024-01-01");
    soap.plan = Some("server".to_string());
    soap.last_updated = 25;
    snapshot.soaps.push(soap);
    snapshot
        .medications
        .push(DrugUpdate::new(&patient.key, "2024-01-02", "aspirin"));

    let engine = MergeEngine::new(&db);
    engine.merge_snapshots(&[snapshot.clone()]).unwrap();
    let first = stored(&db, &patient.key);

    let report = engine.merge_snapshots(&[snapshot]).unwrap();
    assert_eq!(report.stale, vec![patient.key.clone()]);
    assert_eq!(report.records.changed(), 0);
    assert_eq!(stored(&db, &patient.key), first);
}

#[test]
fn test_missing_patient_reported_and_sync_still_recorded() {
    let db = Database::open_in_memory().unwrap();
    let known = seed_patient(&db, "Maria Lopez", 10);
    let unknown = Patient::new("Not Provisioned", "2000-01-01");

    let sync = SyncBookkeeping::new(&db);
    assert_eq!(sync.last_synced().unwrap(), 0);

    let mut snapshot = snapshot_of(&known, 20);
    snapshot
        .medications
        .push(DrugUpdate::new(&known.key, "2024-01-01", "aspirin"));
    let batch = vec![snapshot_of(&unknown, 5), snapshot];

    let report = MergeEngine::new(&db).merge_snapshots(&batch).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0].error,
        MergeError::MissingPatientForSync(key) if *key == unknown.key
    ));
    assert_eq!(report.accepted, vec![known.key.clone()]);
    assert_eq!(stored(&db, &known.key).medications.len(), 1);
    assert!(db::find_patient(db.conn(), &unknown.key).unwrap().is_none());

    assert_eq!(sync.last_synced().unwrap(), report.last_synced);
    assert!(report.last_synced > 0);
}

#[test]
fn test_empty_batch_still_advances_last_synced() {
    let db = Database::open_in_memory().unwrap();
    let report = MergeEngine::new(&db).merge_snapshots(&[]).unwrap();

    assert!(report.is_clean());
    assert_eq!(LocalStore::new(&db).last_synced().unwrap(), report.last_synced);
}

#[test]
fn test_local_write_after_merge_keeps_timestamps_monotonic() {
    let db = Database::open_in_memory().unwrap();
    let store = LocalStore::new(&db);
    let mut patient = Patient::new("Maria Lopez", "1990-04-12");
    store.create_patient(&mut patient).unwrap();

    // Server clock far ahead of the tablet
    let server_time = clinic_core::models::timestamp_now() + 3_600_000;
    let mut snapshot = snapshot_of(&patient, server_time);
    let mut order = DrugUpdate::new(&patient.key, "2024-01-01", "aspirin");
    order.last_updated = server_time;
    snapshot.medications.push(order.clone());
    MergeEngine::new(&db).merge_snapshots(&[snapshot]).unwrap();

    order.dose = Some("325mg".to_string());
    let written = store.create_drug_update(order).unwrap();

    assert!(written.last_updated >= server_time);
    assert!(stored(&db, &patient.key).last_updated >= server_time);
}
