//! Medication orders.

use serde::{Deserialize, Serialize};

use super::{DrugKey, OwnedRecord};

/// Instruction for one drug on one day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrugUpdate {
    pub patient_key: String,
    pub date: String,
    /// Drug name, part of the identity
    pub name: String,
    pub dose: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub last_updated: i64,
}

impl DrugUpdate {
    pub fn new(
        patient_key: impl Into<String>,
        date: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            patient_key: patient_key.into(),
            date: date.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy the prescription fields of `other` onto this order.
    pub fn apply_instruction(&mut self, other: &DrugUpdate) {
        self.dose = other.dose.clone();
        self.frequency = other.frequency.clone();
        self.duration = other.duration.clone();
        self.notes = other.notes.clone();
        self.last_updated = other.last_updated;
    }
}

impl OwnedRecord for DrugUpdate {
    type Key = DrugKey;
    const KIND: &'static str = "drug update";

    fn identity(&self) -> DrugKey {
        DrugKey::new(&self.patient_key, &self.date, &self.name)
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
