//! Settings singleton.

use rusqlite::{Connection, OptionalExtension};

use super::DbResult;

/// Timestamp of the last completed merge batch, if any sync has happened.
pub fn last_synced(conn: &Connection) -> DbResult<Option<i64>> {
    conn.query_row("SELECT last_synced FROM settings WHERE id = 1", [], |row| {
        row.get(0)
    })
    .optional()
    .map_err(Into::into)
}

/// Record a completed merge batch, creating the singleton on first use.
pub fn set_last_synced(conn: &Connection, timestamp: i64) -> DbResult<()> {
    conn.execute(
        "INSERT INTO settings (id, last_synced) VALUES (1, ?1) \
         ON CONFLICT(id) DO UPDATE SET last_synced = excluded.last_synced",
        [timestamp],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_last_synced_lazy_singleton() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(last_synced(db.conn()).unwrap(), None);

        set_last_synced(db.conn(), 100).unwrap();
        set_last_synced(db.conn(), 250).unwrap();
        assert_eq!(last_synced(db.conn()).unwrap(), Some(250));

        let rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
