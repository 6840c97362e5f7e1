//! SOAP clinical notes.

use serde::{Deserialize, Serialize};

use super::{OwnedRecord, VisitKey};

/// Subjective / Objective / Assessment / Plan note for one visit day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Soap {
    pub patient_key: String,
    pub date: String,
    pub subjective: Option<String>,
    pub objective: Option<String>,
    pub assessment: Option<String>,
    pub plan: Option<String>,
    /// Treatments the clinic could not provide
    pub wishlist: Option<String>,
    pub provider: Option<String>,
    #[serde(default)]
    pub last_updated: i64,
}

impl Soap {
    pub fn new(patient_key: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            patient_key: patient_key.into(),
            date: date.into(),
            ..Self::default()
        }
    }
}

impl OwnedRecord for Soap {
    type Key = VisitKey;
    const KIND: &'static str = "soap";

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
