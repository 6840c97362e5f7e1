//! Clinic Core Library
//!
//! Offline-first patient record store for a clinic tablet, with a merge engine
//! that folds server snapshots into local state.
//!
//! # Architecture
//!
//! ```text
//!   Check-in / Triage / Doctor / Pharmacy screens
//!                      │
//!                      ▼
//!               ┌─────────────┐         ┌───────────────────┐
//!               │ LocalStore  │         │   MergeEngine     │◄── snapshot batch
//!               │ (writes +   │         │ patient gate, then│    (transport)
//!               │  reads)     │         │ per-record LWW    │
//!               └──────┬──────┘         └─────────┬─────────┘
//!                      │   Database::write scopes │
//!                      └────────────┬─────────────┘
//!                                   ▼
//!                        SQLite (patients + owned
//!                        statuses/soaps/triages/
//!                        drug_updates, settings)
//!                                   │
//!                                   ▼
//!                         SyncBookkeeping ──► lastSynced, upload queue
//! ```
//!
//! # Modules
//!
//! - [`models`]: Patient and owned record types, identity keys
//! - [`db`]: SQLite database layer and scoped write transactions
//! - [`store`]: Local CRUD operations
//! - [`merge`]: Snapshot merge engine
//! - [`sync`]: Last-synced timestamp and upload queue
//! - [`config`]: Store configuration

pub mod config;
pub mod db;
pub mod merge;
pub mod models;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::StoreConfig;
pub use db::Database;
pub use merge::{MergeEngine, MergeError, MergeOutcome, MergeReport};
pub use models::{
    derive_key, DrugKey, DrugUpdate, Patient, PatientForm, PatientSelectRow, Soap, Status,
    StatusUpdate, Triage, VisitKey,
};
pub use store::{LocalStore, StoreError};
pub use sync::SyncBookkeeping;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Carries the attempted patient as JSON, flagged `needToUpload`.
    #[error("Patient already exists: {0}")]
    DuplicateKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Already checked in: {0}")]
    DuplicateCheckin(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Json(e) => ClinicError::SerializationError(e.to_string()),
            other => ClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<StoreError> for ClinicError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey(key) => ClinicError::DuplicateKey(key),
            StoreError::NotFound(what) => ClinicError::NotFound(what),
            StoreError::Integrity(what) => ClinicError::IntegrityError(what),
            e @ StoreError::DuplicateCheckin { .. } => ClinicError::DuplicateCheckin(e.to_string()),
            StoreError::Db(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for ClinicError {
    fn from(e: config::ConfigError) -> Self {
        ClinicError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    Ok(ClinicCore::wrap(db))
}

/// Open a database from a JSON `StoreConfig`. `CLINIC_*` env vars override it.
#[uniffi::export]
pub fn open_database_with_config(config_json: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = StoreConfig::from_json_with_env(&config_json)?;
    let db = Database::open_with_config(&config)?;
    Ok(ClinicCore::wrap(db))
}

/// Open a database from a config file, falling back to defaults when the
/// file does not exist. `CLINIC_*` env vars override both.
#[uniffi::export]
pub fn open_database_from_config_file(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = StoreConfig::load(Some(std::path::Path::new(&path)))?;
    let db = Database::open_with_config(&config)?;
    Ok(ClinicCore::wrap(db))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(ClinicCore::wrap(db))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// The mutex admits one writer at a time, so a local write and a merge never
/// interleave on the same patient.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

impl ClinicCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient and check them in for today.
    pub fn create_patient(&self, form: FfiPatientForm) -> Result<FfiPatient, ClinicError> {
        let db = self.db.lock()?;
        let mut patient = Patient::from_form(form.into());
        match LocalStore::new(&db).create_patient(&mut patient) {
            Ok(()) => Ok(patient.into()),
            Err(StoreError::DuplicateKey(_)) => {
                Err(ClinicError::DuplicateKey(serde_json::to_string(&patient)?))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check an existing patient in for today.
    pub fn signin_patient(&self, form: FfiPatientForm) -> Result<(), ClinicError> {
        let db = self.db.lock()?;
        LocalStore::new(&db).signin_patient(&form.into())?;
        Ok(())
    }

    /// Get a patient with all owned records, as JSON.
    pub fn get_patient(&self, patient_key: String) -> Result<Option<String>, ClinicError> {
        let db = self.db.lock()?;
        let patient = LocalStore::new(&db).get_patient(&patient_key)?;
        patient
            .map(|p| serde_json::to_string(&p))
            .transpose()
            .map_err(Into::into)
    }

    // =========================================================================
    // Visit Operations
    // =========================================================================

    pub fn update_status(
        &self,
        patient_key: String,
        date: String,
        update: FfiStatusUpdate,
    ) -> Result<(), ClinicError> {
        let db = self.db.lock()?;
        LocalStore::new(&db).update_status(&patient_key, &date, &update.into())?;
        Ok(())
    }

    /// Today's active visits for the patient-select screen.
    pub fn get_patient_select_rows(&self) -> Result<Vec<FfiPatientSelectRow>, ClinicError> {
        let db = self.db.lock()?;
        let rows = LocalStore::new(&db).get_patient_select_rows()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Clinical Records (JSON in, JSON out)
    // =========================================================================

    pub fn create_drug_update(&self, update_json: String) -> Result<String, ClinicError> {
        let update: DrugUpdate = serde_json::from_str(&update_json)?;
        let db = self.db.lock()?;
        let stored = LocalStore::new(&db).create_drug_update(update)?;
        Ok(serde_json::to_string(&stored)?)
    }

    pub fn get_medication_updates(&self, patient_key: String) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let orders = LocalStore::new(&db).get_medication_updates(&patient_key)?;
        Ok(serde_json::to_string(&orders)?)
    }

    /// Update today's SOAP note.
    pub fn update_soap(&self, update_json: String) -> Result<String, ClinicError> {
        let update: Soap = serde_json::from_str(&update_json)?;
        let db = self.db.lock()?;
        let stored = LocalStore::new(&db).update_soap(update)?;
        Ok(serde_json::to_string(&stored)?)
    }

    pub fn get_soap(
        &self,
        patient_key: String,
        date: String,
    ) -> Result<Option<String>, ClinicError> {
        let db = self.db.lock()?;
        let soap = LocalStore::new(&db).get_soap(&patient_key, &date)?;
        soap.map(|s| serde_json::to_string(&s))
            .transpose()
            .map_err(Into::into)
    }

    /// Update today's triage.
    pub fn update_triage(&self, update_json: String) -> Result<String, ClinicError> {
        let update: Triage = serde_json::from_str(&update_json)?;
        let db = self.db.lock()?;
        let stored = LocalStore::new(&db).update_triage(update)?;
        Ok(serde_json::to_string(&stored)?)
    }

    pub fn get_triage(
        &self,
        patient_key: String,
        date: String,
    ) -> Result<Option<String>, ClinicError> {
        let db = self.db.lock()?;
        let triage = LocalStore::new(&db).get_triage(&patient_key, &date)?;
        triage
            .map(|t| serde_json::to_string(&t))
            .transpose()
            .map_err(Into::into)
    }

    // =========================================================================
    // Sync Operations
    // =========================================================================

    /// Merge a JSON array of server snapshots.
    pub fn merge_snapshots(&self, batch_json: String) -> Result<FfiMergeReport, ClinicError> {
        let db = self.db.lock()?;
        let report = MergeEngine::new(&db).merge_snapshots_json(&batch_json)?;
        Ok(report.into())
    }

    /// Patients with local changes to push, as a JSON array.
    pub fn get_updates_to_upload(&self) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let patients = SyncBookkeeping::new(&db).updates_to_upload()?;
        Ok(serde_json::to_string(&patients)?)
    }

    /// Clear upload flags after the server accepted these patients.
    pub fn mark_uploaded(&self, patient_keys: Vec<String>) -> Result<u32, ClinicError> {
        let db = self.db.lock()?;
        let cleared = SyncBookkeeping::new(&db).mark_uploaded(&patient_keys)?;
        Ok(cleared as u32)
    }

    /// Timestamp of the last completed merge batch, or 0.
    pub fn last_synced(&self) -> Result<i64, ClinicError> {
        let db = self.db.lock()?;
        Ok(SyncBookkeeping::new(&db).last_synced()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe check-in form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientForm {
    pub name: String,
    pub birthday: String,
    pub city: Option<String>,
    pub sex: Option<String>,
    pub phone: Option<String>,
}

impl From<FfiPatientForm> for PatientForm {
    fn from(form: FfiPatientForm) -> Self {
        PatientForm {
            name: form.name,
            birthday: form.birthday,
            city: form.city,
            sex: form.sex,
            phone: form.phone,
        }
    }
}

/// FFI-safe patient (demographics only).
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub key: String,
    pub name: String,
    pub birthday: String,
    pub city: Option<String>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub last_updated: i64,
    pub need_to_upload: bool,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            key: patient.key,
            name: patient.name,
            birthday: patient.birthday,
            city: patient.city,
            sex: patient.sex,
            phone: patient.phone,
            last_updated: patient.last_updated,
            need_to_upload: patient.need_to_upload,
        }
    }
}

/// FFI-safe status field change.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiStatusUpdate {
    CheckinTime { value: i64 },
    TriageCompleted { value: bool },
    DoctorCompleted { value: bool },
    PharmacyCompleted { value: bool },
    Notes { value: Option<String> },
    Active { value: bool },
}

impl From<FfiStatusUpdate> for StatusUpdate {
    fn from(update: FfiStatusUpdate) -> Self {
        match update {
            FfiStatusUpdate::CheckinTime { value } => StatusUpdate::CheckinTime(value),
            FfiStatusUpdate::TriageCompleted { value } => StatusUpdate::TriageCompleted(value),
            FfiStatusUpdate::DoctorCompleted { value } => StatusUpdate::DoctorCompleted(value),
            FfiStatusUpdate::PharmacyCompleted { value } => StatusUpdate::PharmacyCompleted(value),
            FfiStatusUpdate::Notes { value } => StatusUpdate::Notes(value),
            FfiStatusUpdate::Active { value } => StatusUpdate::Active(value),
        }
    }
}

/// FFI-safe patient-select row. Field order matches the row's column order.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSelectRow {
    pub name: String,
    pub birthday: String,
    pub checkin_time: i64,
    pub triage_completed: bool,
    pub doctor_completed: bool,
    pub pharmacy_completed: bool,
    pub notes: Option<String>,
    pub patient_key: String,
}

impl From<PatientSelectRow> for FfiPatientSelectRow {
    fn from(row: PatientSelectRow) -> Self {
        Self {
            name: row.name,
            birthday: row.birthday,
            checkin_time: row.checkin_time,
            triage_completed: row.triage_completed,
            doctor_completed: row.doctor_completed,
            pharmacy_completed: row.pharmacy_completed,
            notes: row.notes,
            patient_key: row.patient_key,
        }
    }
}

/// FFI-safe merge summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMergeReport {
    pub accepted: Vec<String>,
    pub stale: Vec<String>,
    pub failed: Vec<FfiMergeFailure>,
    pub inserted: u32,
    pub overwritten: u32,
    pub unchanged: u32,
    pub last_synced: i64,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMergeFailure {
    pub patient_key: String,
    pub message: String,
}

impl From<MergeReport> for FfiMergeReport {
    fn from(report: MergeReport) -> Self {
        Self {
            accepted: report.accepted,
            stale: report.stale,
            failed: report
                .failures
                .into_iter()
                .map(|f| FfiMergeFailure {
                    patient_key: f.patient_key,
                    message: f.error.to_string(),
                })
                .collect(),
            inserted: report.records.inserted as u32,
            overwritten: report.records.overwritten as u32,
            unchanged: report.records.unchanged as u32,
            last_synced: report.last_synced,
        }
    }
}
