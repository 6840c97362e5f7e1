//! Triage assessments.

use serde::{Deserialize, Serialize};

use super::{OwnedRecord, VisitKey};

/// Vitals and intake checks recorded at triage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Triage {
    pub patient_key: String,
    pub date: String,
    pub age: Option<i64>,
    /// kg
    pub weight: Option<f64>,
    /// cm
    pub height: Option<f64>,
    /// °C
    pub temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub pulse: Option<i64>,
    pub respiration: Option<i64>,
    pub oxygen_saturation: Option<i64>,
    #[serde(default)]
    pub labs_done: bool,
    pub notes: Option<String>,
    #[serde(default)]
    pub last_updated: i64,
}

impl Triage {
    pub fn new(patient_key: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            patient_key: patient_key.into(),
            date: date.into(),
            ..Self::default()
        }
    }
}

impl OwnedRecord for Triage {
    type Key = VisitKey;
    const KIND: &'static str = "triage";

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
