//! Patient models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{DrugUpdate, OwnedRecord, Soap, Status, Triage};

/// Derive the patient key from identity fields.
///
/// Deterministic so that check-in forms and server snapshots find the same
/// record. Fields are whitespace-normalized and lowercased, then hashed with a
/// length prefix each so no choice of separator can make two identities
/// collide.
pub fn derive_key(name: &str, birthday: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [normalize_identity_field(name), normalize_identity_field(birthday)] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn normalize_identity_field(field: &str) -> String {
    field
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Demographics as entered on the check-in form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub name: String,
    pub birthday: String,
    pub city: Option<String>,
    pub sex: Option<String>,
    pub phone: Option<String>,
}

impl PatientForm {
    pub fn new(name: impl Into<String>, birthday: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birthday: birthday.into(),
            ..Self::default()
        }
    }

    /// Key of the patient this form refers to.
    pub fn key(&self) -> String {
        derive_key(&self.name, &self.birthday)
    }
}

/// A patient and every record it owns.
///
/// This is also the snapshot shape exchanged with the server: a complete copy
/// of the patient with its visits, notes, triages and medication orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Derived from name + birthday, never random
    pub key: String,
    pub name: String,
    pub birthday: String,
    pub city: Option<String>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    /// Epoch millis of the last accepted change anywhere in the patient graph
    #[serde(default)]
    pub last_updated: i64,
    /// Local changes not yet pushed to the server
    #[serde(default)]
    pub need_to_upload: bool,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub soaps: Vec<Soap>,
    #[serde(default)]
    pub triages: Vec<Triage>,
    #[serde(default)]
    pub medications: Vec<DrugUpdate>,
}

impl Patient {
    /// Create a patient with required fields and no owned records.
    pub fn new(name: impl Into<String>, birthday: impl Into<String>) -> Self {
        Self::from_form(PatientForm::new(name, birthday))
    }

    pub fn from_form(form: PatientForm) -> Self {
        Self {
            key: form.key(),
            name: form.name,
            birthday: form.birthday,
            city: form.city,
            sex: form.sex,
            phone: form.phone,
            last_updated: 0,
            need_to_upload: false,
            statuses: Vec::new(),
            soaps: Vec::new(),
            triages: Vec::new(),
            medications: Vec::new(),
        }
    }

    /// Point every owned record at this patient's key.
    pub fn adopt_records(&mut self) {
        let key = self.key.clone();
        self.statuses.iter_mut().for_each(|r| r.reown(&key));
        self.soaps.iter_mut().for_each(|r| r.reown(&key));
        self.triages.iter_mut().for_each(|r| r.reown(&key));
        self.medications.iter_mut().for_each(|r| r.reown(&key));
    }

    /// Patient row only, without owned records.
    pub fn without_records(&self) -> Self {
        Self {
            statuses: Vec::new(),
            soaps: Vec::new(),
            triages: Vec::new(),
            medications: Vec::new(),
            ..self.clone()
        }
    }

    /// Total number of owned records.
    pub fn record_count(&self) -> usize {
        self.statuses.len() + self.soaps.len() + self.triages.len() + self.medications.len()
    }
}
