//! Table access shared by every owned record kind.

use rusqlite::Connection;

use super::DbResult;
use crate::models::OwnedRecord;

/// Storage operations for a record kind keyed by its composite identity.
///
/// Callers that need read-compare-write atomicity run these inside
/// [`Database::write`](super::Database::write).
pub trait RecordTable: OwnedRecord + Sized {
    /// Look up the record with exactly this identity.
    fn find(conn: &Connection, key: &Self::Key) -> DbResult<Option<Self>>;

    /// All records owned by a patient, in insertion order.
    fn list_for_patient(conn: &Connection, patient_key: &str) -> DbResult<Vec<Self>>;

    /// Insert as a new record. Fails if the identity is already taken.
    fn insert(&self, conn: &Connection) -> DbResult<()>;

    /// Replace every field of the stored record with the same identity.
    /// Returns false when no such record exists.
    fn overwrite(&self, conn: &Connection) -> DbResult<bool>;
}
