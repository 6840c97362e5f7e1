//! Patient registration, check-in and visit status writes.

use super::{require_patient, LocalStore, StoreError, StoreResult};
use crate::db::{self, RecordTable};
use crate::models::{
    current_date, next_timestamp, timestamp_now, Patient, PatientForm, Status, StatusUpdate,
    VisitKey,
};

impl LocalStore<'_> {
    /// Register a new patient and check them in for today.
    ///
    /// If the key is already taken the incoming `patient` is flagged
    /// `need_to_upload` before the error is returned, so the caller keeps the
    /// attempted record for manual reconciliation.
    pub fn create_patient(&self, patient: &mut Patient) -> StoreResult<()> {
        let now = timestamp_now();
        patient.last_updated = now;
        let status = Status::check_in(patient, current_date(), now);

        let candidate = &*patient;
        let result = self.db.write(|conn| {
            if db::patient_exists(conn, &candidate.key)? {
                return Err(StoreError::DuplicateKey(candidate.key.clone()));
            }
            let mut record = candidate.clone();
            record.statuses = vec![status];
            record.adopt_records();
            db::insert_patient(conn, &record)?;
            Ok(record)
        });

        match result {
            Ok(record) => {
                tracing::info!(patient_key = %record.key, "registered patient");
                *patient = record;
                Ok(())
            }
            Err(err @ StoreError::DuplicateKey(_)) => {
                tracing::warn!(patient_key = %patient.key, "patient already exists, keeping attempt for upload");
                patient.need_to_upload = true;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Check an existing patient in for today.
    pub fn signin_patient(&self, form: &PatientForm) -> StoreResult<Status> {
        let key = form.key();
        let date = current_date();

        self.db.write(|conn| {
            let mut matches = db::find_patient_rows(conn, &key)?;
            if matches.len() > 1 {
                return Err(StoreError::Integrity(format!(
                    "{} patients share key {key}",
                    matches.len()
                )));
            }
            let patient = matches
                .pop()
                .ok_or_else(|| StoreError::NotFound(format!("patient {key}")))?;

            if Status::find(conn, &VisitKey::new(&key, &date))?.is_some() {
                return Err(StoreError::DuplicateCheckin {
                    patient_key: key.clone(),
                    date: date.clone(),
                });
            }

            let now = next_timestamp(patient.last_updated);
            let status = Status::check_in(&patient, date.clone(), now);
            status.insert(conn)?;
            db::bump_patient_last_updated(conn, &key, now)?;
            tracing::debug!(patient_key = %key, %date, "checked in");
            Ok(status)
        })
    }

    /// Change one field of a visit and stamp the visit and its patient.
    pub fn update_status(
        &self,
        patient_key: &str,
        date: &str,
        update: &StatusUpdate,
    ) -> StoreResult<Status> {
        let visit = VisitKey::new(patient_key, date);

        self.db.write(|conn| {
            let mut status = Status::find(conn, &visit)?
                .ok_or_else(|| StoreError::NotFound(format!("status for {visit}")))?;
            let patient = require_patient(conn, patient_key)?;

            let now = next_timestamp(status.last_updated.max(patient.last_updated));
            update.apply(&mut status);
            status.last_updated = now;
            status.overwrite(conn)?;
            db::bump_patient_last_updated(conn, patient_key, now)?;
            tracing::debug!(%visit, field = update.field_name(), "updated status");
            Ok(status)
        })
    }
}
