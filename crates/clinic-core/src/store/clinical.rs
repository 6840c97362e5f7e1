//! Medication orders, SOAP notes and triage writes.

use super::{require_patient, LocalStore, StoreResult};
use crate::db::{self, RecordTable};
use crate::models::{current_date, next_timestamp, DrugUpdate, OwnedRecord, Soap, Triage};

impl LocalStore<'_> {
    /// Write a medication order.
    ///
    /// An order for the same `(date, name)` is overwritten in place; any other
    /// order is appended.
    pub fn create_drug_update(&self, update: DrugUpdate) -> StoreResult<DrugUpdate> {
        self.db.write(|conn| {
            let patient = require_patient(conn, &update.patient_key)?;
            let existing = DrugUpdate::find(conn, &update.identity())?;

            let previous = existing.as_ref().map_or(0, |order| order.last_updated);
            let now = next_timestamp(previous.max(patient.last_updated));
            let mut incoming = update;
            incoming.last_updated = now;

            let stored = match existing {
                Some(mut order) => {
                    order.apply_instruction(&incoming);
                    order.overwrite(conn)?;
                    order
                }
                None => {
                    incoming.insert(conn)?;
                    incoming
                }
            };
            db::bump_patient_last_updated(conn, &patient.key, now)?;
            tracing::debug!(order = %stored.identity(), "wrote drug update");
            Ok(stored)
        })
    }

    /// Update today's SOAP note for `update.patient_key`.
    ///
    /// The date carried by `update` is ignored: local writers only ever edit
    /// the note for the current day.
    pub fn update_soap(&self, update: Soap) -> StoreResult<Soap> {
        self.update_soap_on(update, &current_date())
    }

    /// Update the SOAP note for `effective_date`.
    pub fn update_soap_on(&self, update: Soap, effective_date: &str) -> StoreResult<Soap> {
        self.update_daily_record(update, effective_date)
    }

    /// Update today's triage for `update.patient_key`.
    ///
    /// Same date rule as [`update_soap`](Self::update_soap).
    pub fn update_triage(&self, update: Triage) -> StoreResult<Triage> {
        self.update_triage_on(update, &current_date())
    }

    /// Update the triage for `effective_date`.
    pub fn update_triage_on(&self, update: Triage, effective_date: &str) -> StoreResult<Triage> {
        self.update_daily_record(update, effective_date)
    }

    fn update_daily_record<R: RecordTable>(&self, mut update: R, date: &str) -> StoreResult<R> {
        update.set_date(date);

        self.db.write(|conn| {
            let patient = require_patient(conn, update.patient_key())?;
            let existing = R::find(conn, &update.identity())?;

            let previous = existing.as_ref().map_or(0, |record| record.last_updated());
            let now = next_timestamp(previous.max(patient.last_updated));
            update.set_last_updated(now);

            if existing.is_some() {
                update.overwrite(conn)?;
            } else {
                update.insert(conn)?;
            }
            db::bump_patient_last_updated(conn, &patient.key, now)?;
            tracing::debug!(kind = R::KIND, key = %update.identity(), "wrote daily record");
            Ok(update)
        })
    }
}
