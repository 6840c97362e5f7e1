//! Record identity keys, ownership, and clock helpers.
//!
//! Every sub-record a patient owns is matched by a composite identity:
//! `(patient_key, date)` for visits and notes, `(patient_key, date, name)` for
//! medication orders. Keys are plain value types compared structurally.

use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Current time as milliseconds since the Unix epoch.
pub fn timestamp_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Timestamp for a local write to a record last stamped at `previous`.
///
/// Never lower than `previous`, so `last_updated` only moves forward even when
/// a merged server timestamp is ahead of the tablet clock.
pub fn next_timestamp(previous: i64) -> i64 {
    timestamp_now().max(previous)
}

/// Calendar-day key for today in local time.
pub fn current_date() -> String {
    date_key(&Local::now())
}

/// Calendar-day key (`YYYY-MM-DD`) for an instant.
pub fn date_key<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    instant.format("%Y-%m-%d").to_string()
}

/// Identity of a once-per-day record (Status, Soap, Triage).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitKey {
    pub patient_key: String,
    pub date: String,
}

impl VisitKey {
    pub fn new(patient_key: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            patient_key: patient_key.into(),
            date: date.into(),
        }
    }
}

impl fmt::Display for VisitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patient {} on {}", self.patient_key, self.date)
    }
}

/// Identity of a medication order: several drugs may share a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrugKey {
    pub patient_key: String,
    pub date: String,
    pub name: String,
}

impl DrugKey {
    pub fn new(
        patient_key: impl Into<String>,
        date: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            patient_key: patient_key.into(),
            date: date.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DrugKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for patient {} on {}",
            self.name, self.patient_key, self.date
        )
    }
}

/// A record whose lifecycle is bound to exactly one patient.
pub trait OwnedRecord {
    /// Composite identity used for uniqueness and merge matching.
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display;

    /// Short name of the record kind, used in logs and errors.
    const KIND: &'static str;

    fn identity(&self) -> Self::Key;

    fn patient_key(&self) -> &str;

    fn last_updated(&self) -> i64;

    fn set_last_updated(&mut self, timestamp: i64);

    /// Attach the record to a patient, replacing whatever owner it carried.
    fn reown(&mut self, patient_key: &str);

    /// Move the record to another calendar day.
    fn set_date(&mut self, date: &str);
}
