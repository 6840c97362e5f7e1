//! Medication order database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbResult, RecordTable};
use crate::models::{DrugKey, DrugUpdate};

const DRUG_UPDATE_COLUMNS: &str =
    "patient_key, date, name, dose, frequency, duration, notes, last_updated";

fn drug_update_from_row(row: &Row<'_>) -> rusqlite::Result<DrugUpdate> {
    Ok(DrugUpdate {
        patient_key: row.get(0)?,
        date: row.get(1)?,
        name: row.get(2)?,
        dose: row.get(3)?,
        frequency: row.get(4)?,
        duration: row.get(5)?,
        notes: row.get(6)?,
        last_updated: row.get(7)?,
    })
}

impl RecordTable for DrugUpdate {
    fn find(conn: &Connection, key: &DrugKey) -> DbResult<Option<Self>> {
        conn.query_row(
            &format!(
                "SELECT {DRUG_UPDATE_COLUMNS} FROM drug_updates \
                 WHERE patient_key = ?1 AND date = ?2 AND name = ?3"
            ),
            params![key.patient_key, key.date, key.name],
            drug_update_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn list_for_patient(conn: &Connection, patient_key: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {DRUG_UPDATE_COLUMNS} FROM drug_updates WHERE patient_key = ? ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([patient_key], drug_update_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert(&self, conn: &Connection) -> DbResult<()> {
        conn.execute(
            &format!(
                "INSERT INTO drug_updates ({DRUG_UPDATE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                self.patient_key,
                self.date,
                self.name,
                self.dose,
                self.frequency,
                self.duration,
                self.notes,
                self.last_updated,
            ],
        )?;
        Ok(())
    }

    fn overwrite(&self, conn: &Connection) -> DbResult<bool> {
        let rows_affected = conn.execute(
            r#"
            UPDATE drug_updates SET
                dose = ?4,
                frequency = ?5,
                duration = ?6,
                notes = ?7,
                last_updated = ?8
            WHERE patient_key = ?1 AND date = ?2 AND name = ?3
            "#,
            params![
                self.patient_key,
                self.date,
                self.name,
                self.dose,
                self.frequency,
                self.duration,
                self.notes,
                self.last_updated,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}
