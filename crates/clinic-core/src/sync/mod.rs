//! Sync bookkeeping: when the last merge batch finished and which patients
//! still have local changes to push.

use crate::db::{self, Database, DbResult};
use crate::models::Patient;
use crate::store::{StoreError, StoreResult};

/// Tracks sync progress for the transport layer.
pub struct SyncBookkeeping<'a> {
    db: &'a Database,
}

impl<'a> SyncBookkeeping<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Timestamp of the last completed merge batch, or 0 if never synced.
    pub fn last_synced(&self) -> DbResult<i64> {
        Ok(db::last_synced(self.db.conn())?.unwrap_or(0))
    }

    /// Mark a merge batch as completed at `timestamp`.
    pub fn record_sync(&self, timestamp: i64) -> DbResult<()> {
        self.db.write(|conn| db::set_last_synced(conn, timestamp))
    }

    /// Patients whose local changes have not been pushed yet.
    pub fn updates_to_upload(&self) -> DbResult<Vec<Patient>> {
        db::list_patients_needing_upload(self.db.conn())
    }

    /// Persist the upload flag on a stored patient.
    pub fn flag_for_upload(&self, patient_key: &str) -> StoreResult<()> {
        let found = self
            .db
            .write(|conn| db::set_need_to_upload(conn, patient_key, true))?;
        if !found {
            return Err(StoreError::NotFound(format!("patient {patient_key}")));
        }
        Ok(())
    }

    /// Clear the upload flag once the server has accepted these patients.
    /// Returns how many stored patients were cleared.
    pub fn mark_uploaded(&self, patient_keys: &[String]) -> DbResult<usize> {
        let cleared = self.db.write(|conn| -> DbResult<usize> {
            let mut cleared = 0;
            for key in patient_keys {
                if db::set_need_to_upload(conn, key, false)? {
                    cleared += 1;
                }
            }
            Ok(cleared)
        })?;
        tracing::debug!(cleared, "cleared upload flags");
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_last_synced_defaults_to_zero() {
        let db = setup_db();
        let sync = SyncBookkeeping::new(&db);
        assert_eq!(sync.last_synced().unwrap(), 0);

        sync.record_sync(1_700_000_000_000).unwrap();
        assert_eq!(sync.last_synced().unwrap(), 1_700_000_000_000);
    }

    #[test]
    fn test_upload_flag_cycle() {
        let db = setup_db();
        let sync = SyncBookkeeping::new(&db);

        let patient = Patient::new("Maria Lopez", "1990-04-12");
        db::insert_patient(db.conn(), &patient).unwrap();
        assert!(sync.updates_to_upload().unwrap().is_empty());

        sync.flag_for_upload(&patient.key).unwrap();
        let pending = sync.updates_to_upload().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].need_to_upload);

        let cleared = sync
            .mark_uploaded(&[patient.key.clone(), "unknown".to_string()])
            .unwrap();
        assert_eq!(cleared, 1);
        assert!(sync.updates_to_upload().unwrap().is_empty());
    }

    #[test]
    fn test_flag_missing_patient() {
        let db = setup_db();
        let sync = SyncBookkeeping::new(&db);
        assert!(matches!(
            sync.flag_for_upload("missing"),
            Err(StoreError::NotFound(_))
        ));
    }
}
