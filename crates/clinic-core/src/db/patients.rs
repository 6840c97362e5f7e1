//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbError, DbResult, RecordTable};
use crate::models::{DrugUpdate, OwnedRecord, Patient, Soap, Status, Triage};

const PATIENT_COLUMNS: &str =
    "key, name, birthday, city, sex, phone, last_updated, need_to_upload";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        key: row.get(0)?,
        name: row.get(1)?,
        birthday: row.get(2)?,
        city: row.get(3)?,
        sex: row.get(4)?,
        phone: row.get(5)?,
        last_updated: row.get(6)?,
        need_to_upload: row.get(7)?,
        statuses: Vec::new(),
        soaps: Vec::new(),
        triages: Vec::new(),
        medications: Vec::new(),
    })
}

fn load_records(conn: &Connection, patient: &mut Patient) -> DbResult<()> {
    patient.statuses = Status::list_for_patient(conn, &patient.key)?;
    patient.soaps = Soap::list_for_patient(conn, &patient.key)?;
    patient.triages = Triage::list_for_patient(conn, &patient.key)?;
    patient.medications = DrugUpdate::list_for_patient(conn, &patient.key)?;
    Ok(())
}

fn check_owner<R: OwnedRecord>(patient: &Patient, records: &[R]) -> DbResult<()> {
    match records.iter().find(|r| r.patient_key() != patient.key) {
        Some(stray) => Err(DbError::InvalidData(format!(
            "{} {} does not belong to patient {}",
            R::KIND,
            stray.identity(),
            patient.key
        ))),
        None => Ok(()),
    }
}

/// Insert a patient together with every record it owns.
///
/// Every owned record must already carry the patient's key.
pub fn insert_patient(conn: &Connection, patient: &Patient) -> DbResult<()> {
    check_owner(patient, &patient.statuses)?;
    check_owner(patient, &patient.soaps)?;
    check_owner(patient, &patient.triages)?;
    check_owner(patient, &patient.medications)?;

    conn.execute(
        &format!("INSERT INTO patients ({PATIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            patient.key,
            patient.name,
            patient.birthday,
            patient.city,
            patient.sex,
            patient.phone,
            patient.last_updated,
            patient.need_to_upload,
        ],
    )?;

    for status in &patient.statuses {
        status.insert(conn)?;
    }
    for soap in &patient.soaps {
        soap.insert(conn)?;
    }
    for triage in &patient.triages {
        triage.insert(conn)?;
    }
    for order in &patient.medications {
        order.insert(conn)?;
    }
    Ok(())
}

/// Get a patient row by key, without owned records.
pub fn find_patient_row(conn: &Connection, key: &str) -> DbResult<Option<Patient>> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE key = ?"),
        [key],
        patient_from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Every patient row matching `key`. More than one means the store is corrupt.
pub fn find_patient_rows(conn: &Connection, key: &str) -> DbResult<Vec<Patient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE key = ?"
    ))?;
    let rows = stmt.query_map([key], patient_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get a patient by key with all owned records.
pub fn find_patient(conn: &Connection, key: &str) -> DbResult<Option<Patient>> {
    match find_patient_row(conn, key)? {
        Some(mut patient) => {
            load_records(conn, &mut patient)?;
            Ok(Some(patient))
        }
        None => Ok(None),
    }
}

pub fn patient_exists(conn: &Connection, key: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE key = ?",
        [key],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Raise a patient's `last_updated` to `timestamp`. Never lowers it.
///
/// Returns false when the patient is missing or already at or past
/// `timestamp`.
pub fn bump_patient_last_updated(conn: &Connection, key: &str, timestamp: i64) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE patients SET last_updated = ?2 WHERE key = ?1 AND last_updated < ?2",
        params![key, timestamp],
    )?;
    Ok(rows_affected > 0)
}

/// Patients with local changes pending upload, with owned records.
pub fn list_patients_needing_upload(conn: &Connection) -> DbResult<Vec<Patient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE need_to_upload = 1 ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], patient_from_row)?;

    let mut patients = Vec::new();
    for row in rows {
        let mut patient = row?;
        load_records(conn, &mut patient)?;
        patients.push(patient);
    }
    Ok(patients)
}

pub fn set_need_to_upload(conn: &Connection, key: &str, need_to_upload: bool) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE patients SET need_to_upload = ?2 WHERE key = ?1",
        params![key, need_to_upload],
    )?;
    Ok(rows_affected > 0)
}
