//! Local record store.
//!
//! Every write is one [`Database::write`] scope: the existence checks, the
//! timestamp reads and the mutation commit together or not at all.

mod checkin;
mod clinical;

use thiserror::Error;

use crate::db::{self, Database, DbError, RecordTable};
use crate::models::{current_date, DrugUpdate, Patient, PatientSelectRow, Soap, Triage, VisitKey};

/// Errors surfaced by local write operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Patient already exists: {0}")]
    DuplicateKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Patient {patient_key} already checked in on {date}")]
    DuplicateCheckin { patient_key: String, date: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD operations on the patient graph.
pub struct LocalStore<'a> {
    db: &'a Database,
}

impl<'a> LocalStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a patient with all owned records.
    pub fn get_patient(&self, key: &str) -> StoreResult<Option<Patient>> {
        Ok(db::find_patient(self.db.conn(), key)?)
    }

    /// Medication orders for a patient, in the order they were first written.
    pub fn get_medication_updates(&self, patient_key: &str) -> StoreResult<Vec<DrugUpdate>> {
        Ok(DrugUpdate::list_for_patient(self.db.conn(), patient_key)?)
    }

    pub fn get_soap(&self, patient_key: &str, date: &str) -> StoreResult<Option<Soap>> {
        Ok(Soap::find(self.db.conn(), &VisitKey::new(patient_key, date))?)
    }

    pub fn get_triage(&self, patient_key: &str, date: &str) -> StoreResult<Option<Triage>> {
        Ok(Triage::find(self.db.conn(), &VisitKey::new(patient_key, date))?)
    }

    /// Today's active visits, earliest check-in first.
    pub fn get_patient_select_rows(&self) -> StoreResult<Vec<PatientSelectRow>> {
        Ok(db::select_rows_for_date(self.db.conn(), &current_date())?)
    }

    /// Patients flagged as having local changes the server has not seen.
    pub fn get_updates_to_upload(&self) -> StoreResult<Vec<Patient>> {
        Ok(db::list_patients_needing_upload(self.db.conn())?)
    }

    /// Timestamp of the last completed merge batch, or 0 if never synced.
    pub fn last_synced(&self) -> StoreResult<i64> {
        Ok(db::last_synced(self.db.conn())?.unwrap_or(0))
    }
}

/// Load the patient row `key` or fail with `NotFound`.
fn require_patient(conn: &rusqlite::Connection, key: &str) -> StoreResult<Patient> {
    db::find_patient_row(conn, key)?
        .ok_or_else(|| StoreError::NotFound(format!("patient {key}")))
}
