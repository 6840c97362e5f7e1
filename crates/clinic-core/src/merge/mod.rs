//! Snapshot merge engine.
//!
//! Reconciles server snapshots with the local patient graph in two steps:
//!
//! 1. **Patient gate.** A snapshot is inspected only if its `last_updated` is
//!    strictly greater than the local patient's. Otherwise it is stale and
//!    dropped whole, even if some of its records are newer.
//! 2. **Record LWW.** Each incoming record is matched by identity. Unknown
//!    records are inserted; known ones are overwritten in full only when the
//!    incoming `last_updated` is strictly greater. Ties keep the local copy,
//!    which makes replaying a batch a no-op.
//!
//! Each record decision and the final patient bump run in their own write
//! scope. The bump comes last, so a batch interrupted halfway is simply
//! merged again on the next pass.

use serde_json::Value;
use thiserror::Error;

use crate::db::{self, Database, DbError, DbResult, RecordTable};
use crate::models::{timestamp_now, OwnedRecord, Patient};
use crate::sync::SyncBookkeeping;

/// Why one patient in a batch could not be merged.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Snapshot references patient {0} which does not exist locally")]
    MissingPatientForSync(String),

    #[error("Snapshot at position {position} could not be decoded: {reason}")]
    InvalidSnapshot { position: usize, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// What happened to one incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No local record had this identity
    Inserted,
    /// Incoming record was newer and replaced the local one
    Overwritten,
    /// Local record was as new or newer
    Unchanged,
}

/// Per-record tallies across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub inserted: usize,
    pub overwritten: usize,
    pub unchanged: usize,
}

impl RecordCounts {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Overwritten => self.overwritten += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of records whose stored state changed.
    pub fn changed(&self) -> usize {
        self.inserted + self.overwritten
    }
}

/// A patient the batch could not merge.
#[derive(Debug)]
pub struct MergeFailure {
    pub patient_key: String,
    pub error: MergeError,
}

/// Result of merging one batch.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Patients whose snapshot passed the gate and was merged
    pub accepted: Vec<String>,
    /// Patients whose snapshot was not newer than local state
    pub stale: Vec<String>,
    pub failures: Vec<MergeFailure>,
    pub records: RecordCounts,
    /// Value written to the settings singleton
    pub last_synced: i64,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum PatientMerge {
    Accepted,
    Stale,
}

/// Merges server snapshots into the local store.
pub struct MergeEngine<'a> {
    db: &'a Database,
}

impl<'a> MergeEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Merge a batch of patient snapshots, in order.
    ///
    /// A patient that fails is recorded in the report and the batch carries
    /// on. `last_synced` is advanced exactly once when the batch finishes,
    /// failures or not. Only a failure to write `last_synced` fails the call.
    pub fn merge_snapshots(&self, incoming: &[Patient]) -> DbResult<MergeReport> {
        let mut report = MergeReport::default();
        for snapshot in incoming {
            self.merge_into(&mut report, snapshot);
        }
        self.finish(report)
    }

    /// Merge a JSON array of patient snapshots as delivered by the transport.
    ///
    /// Each element is decoded on its own. One that does not decode is
    /// reported as a failure under its `key` (or `#<position>` when it has
    /// none) and the rest of the batch is merged. Only a batch that is not a
    /// JSON array fails the call.
    pub fn merge_snapshots_json(&self, batch: &str) -> DbResult<MergeReport> {
        let elements: Vec<Value> = serde_json::from_str(batch)?;
        let mut report = MergeReport::default();

        for (position, element) in elements.into_iter().enumerate() {
            let label = element
                .get("key")
                .and_then(Value::as_str)
                .map_or_else(|| format!("#{position}"), str::to_string);

            match serde_json::from_value::<Patient>(element) {
                Ok(snapshot) => self.merge_into(&mut report, &snapshot),
                Err(e) => {
                    let error = MergeError::InvalidSnapshot {
                        position,
                        reason: e.to_string(),
                    };
                    tracing::warn!(patient_key = %label, %error, "skipping undecodable snapshot");
                    report.failures.push(MergeFailure {
                        patient_key: label,
                        error,
                    });
                }
            }
        }
        self.finish(report)
    }

    fn merge_into(&self, report: &mut MergeReport, snapshot: &Patient) {
        match self.merge_patient(snapshot, &mut report.records) {
            Ok(PatientMerge::Accepted) => report.accepted.push(snapshot.key.clone()),
            Ok(PatientMerge::Stale) => report.stale.push(snapshot.key.clone()),
            Err(error) => {
                tracing::warn!(patient_key = %snapshot.key, %error, "failed to merge snapshot");
                report.failures.push(MergeFailure {
                    patient_key: snapshot.key.clone(),
                    error,
                });
            }
        }
    }

    /// Stamp `last_synced` once for the whole batch.
    fn finish(&self, mut report: MergeReport) -> DbResult<MergeReport> {
        let now = timestamp_now();
        SyncBookkeeping::new(self.db).record_sync(now)?;
        report.last_synced = now;

        tracing::info!(
            accepted = report.accepted.len(),
            stale = report.stale.len(),
            failed = report.failures.len(),
            inserted = report.records.inserted,
            overwritten = report.records.overwritten,
            "merged snapshot batch"
        );
        Ok(report)
    }

    fn merge_patient(
        &self,
        snapshot: &Patient,
        counts: &mut RecordCounts,
    ) -> Result<PatientMerge, MergeError> {
        let existing = db::find_patient_row(self.db.conn(), &snapshot.key)?
            .ok_or_else(|| MergeError::MissingPatientForSync(snapshot.key.clone()))?;

        if snapshot.last_updated <= existing.last_updated {
            tracing::debug!(
                patient_key = %existing.key,
                incoming = snapshot.last_updated,
                local = existing.last_updated,
                "skipping stale snapshot"
            );
            return Ok(PatientMerge::Stale);
        }

        tracing::debug!(
            patient_key = %existing.key,
            records = snapshot.record_count(),
            "merging snapshot"
        );
        self.merge_collection(&existing.key, &snapshot.soaps, counts)?;
        self.merge_collection(&existing.key, &snapshot.triages, counts)?;
        self.merge_collection(&existing.key, &snapshot.medications, counts)?;
        self.merge_collection(&existing.key, &snapshot.statuses, counts)?;

        self.db.write(|conn| {
            db::bump_patient_last_updated(conn, &existing.key, snapshot.last_updated)
        })?;
        Ok(PatientMerge::Accepted)
    }

    fn merge_collection<R>(
        &self,
        owner_key: &str,
        incoming: &[R],
        counts: &mut RecordCounts,
    ) -> DbResult<()>
    where
        R: RecordTable + Clone,
    {
        for record in incoming {
            let mut record = record.clone();
            record.reown(owner_key);
            let outcome = self.db.write(|conn| reconcile(conn, &record))?;
            tracing::trace!(kind = R::KIND, key = %record.identity(), ?outcome, "merged record");
            counts.record(outcome);
        }
        Ok(())
    }
}

/// Apply one incoming record under last-writer-wins.
pub fn reconcile<R: RecordTable>(conn: &rusqlite::Connection, incoming: &R) -> DbResult<MergeOutcome> {
    match R::find(conn, &incoming.identity())? {
        None => {
            incoming.insert(conn)?;
            Ok(MergeOutcome::Inserted)
        }
        Some(existing) if incoming.last_updated() > existing.last_updated() => {
            incoming.overwrite(conn)?;
            Ok(MergeOutcome::Overwritten)
        }
        Some(_) => Ok(MergeOutcome::Unchanged),
    }
}
