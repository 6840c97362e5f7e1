//! Clinic visit status and the patient-select projection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{OwnedRecord, Patient, VisitKey};

fn default_active() -> bool {
    true
}

/// One clinic visit. At most one per patient per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub patient_key: String,
    pub date: String,
    /// Copied from the patient for the select-row projection
    pub name: String,
    pub birthday: String,
    pub checkin_time: i64,
    #[serde(default)]
    pub triage_completed: bool,
    #[serde(default)]
    pub doctor_completed: bool,
    #[serde(default)]
    pub pharmacy_completed: bool,
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub last_updated: i64,
}

impl Status {
    /// New active visit for `patient` on `date`, checked in at `now`.
    pub fn check_in(patient: &Patient, date: impl Into<String>, now: i64) -> Self {
        Self {
            patient_key: patient.key.clone(),
            date: date.into(),
            name: patient.name.clone(),
            birthday: patient.birthday.clone(),
            checkin_time: now,
            triage_completed: false,
            doctor_completed: false,
            pharmacy_completed: false,
            notes: None,
            active: true,
            last_updated: now,
        }
    }
}

impl OwnedRecord for Status {
    type Key = VisitKey;
    const KIND: &'static str = "status";

    fn identity(&self) -> VisitKey {
        VisitKey::new(&self.patient_key, &self.date)
    }

    fn patient_key(&self) -> &str {
        &self.patient_key
    }

    fn last_updated(&self) -> i64 {
        self.last_updated
    }

    fn set_last_updated(&mut self, timestamp: i64) {
        self.last_updated = timestamp;
    }

    fn reown(&mut self, patient_key: &str) {
        self.patient_key = patient_key.to_string();
    }

    fn set_date(&mut self, date: &str) {
        self.date = date.to_string();
    }
}

/// A single-field change to a visit, typed per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum StatusUpdate {
    CheckinTime(i64),
    TriageCompleted(bool),
    DoctorCompleted(bool),
    PharmacyCompleted(bool),
    Notes(Option<String>),
    Active(bool),
}

impl StatusUpdate {
    pub fn apply(&self, status: &mut Status) {
        match self {
            StatusUpdate::CheckinTime(t) => status.checkin_time = *t,
            StatusUpdate::TriageCompleted(v) => status.triage_completed = *v,
            StatusUpdate::DoctorCompleted(v) => status.doctor_completed = *v,
            StatusUpdate::PharmacyCompleted(v) => status.pharmacy_completed = *v,
            StatusUpdate::Notes(notes) => status.notes = notes.clone(),
            StatusUpdate::Active(v) => status.active = *v,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            StatusUpdate::CheckinTime(_) => "checkinTime",
            StatusUpdate::TriageCompleted(_) => "triageCompleted",
            StatusUpdate::DoctorCompleted(_) => "doctorCompleted",
            StatusUpdate::PharmacyCompleted(_) => "pharmacyCompleted",
            StatusUpdate::Notes(_) => "notes",
            StatusUpdate::Active(_) => "active",
        }
    }
}

/// Column order of a patient-select row. Callers index rows positionally.
pub const SELECT_ROW_COLUMNS: [&str; 8] = [
    "name",
    "birthday",
    "checkinTime",
    "triageCompleted",
    "doctorCompleted",
    "pharmacyCompleted",
    "notes",
    "patientKey",
];

/// Row shown on the patient-select screen for one of today's active visits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSelectRow {
    pub name: String,
    pub birthday: String,
    pub checkin_time: i64,
    pub triage_completed: bool,
    pub doctor_completed: bool,
    pub pharmacy_completed: bool,
    pub notes: Option<String>,
    pub patient_key: String,
}

impl PatientSelectRow {
    /// Values in [`SELECT_ROW_COLUMNS`] order.
    pub fn columns(&self) -> Vec<Value> {
        vec![
            json!(self.name),
            json!(self.birthday),
            json!(self.checkin_time),
            json!(self.triage_completed),
            json!(self.doctor_completed),
            json!(self.pharmacy_completed),
            json!(self.notes),
            json!(self.patient_key),
        ]
    }
}

impl From<&Status> for PatientSelectRow {
    fn from(status: &Status) -> Self {
        Self {
            name: status.name.clone(),
            birthday: status.birthday.clone(),
            checkin_time: status.checkin_time,
            triage_completed: status.triage_completed,
            doctor_completed: status.doctor_completed,
            pharmacy_completed: status.pharmacy_completed,
            notes: status.notes.clone(),
            patient_key: status.patient_key.clone(),
        }
    }
}
