//! Triage database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbResult, RecordTable};
use crate::models::{Triage, VisitKey};

const TRIAGE_COLUMNS: &str = "patient_key, date, age, weight, height, temperature, \
     blood_pressure, pulse, respiration, oxygen_saturation, labs_done, notes, last_updated";

fn triage_from_row(row: &Row<'_>) -> rusqlite::Result<Triage> {
    Ok(Triage {
        patient_key: row.get(0)?,
        date: row.get(1)?,
        age: row.get(2)?,
        weight: row.get(3)?,
        height: row.get(4)?,
        temperature: row.get(5)?,
        blood_pressure: row.get(6)?,
        pulse: row.get(7)?,
        respiration: row.get(8)?,
        oxygen_saturation: row.get(9)?,
        labs_done: row.get(10)?,
        notes: row.get(11)?,
        last_updated: row.get(12)?,
    })
}

impl RecordTable for Triage {
    fn find(conn: &Connection, key: &VisitKey) -> DbResult<Option<Self>> {
        conn.query_row(
            &format!("SELECT {TRIAGE_COLUMNS} FROM triages WHERE patient_key = ?1 AND date = ?2"),
            params![key.patient_key, key.date],
            triage_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn list_for_patient(conn: &Connection, patient_key: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRIAGE_COLUMNS} FROM triages WHERE patient_key = ? ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([patient_key], triage_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert(&self, conn: &Connection) -> DbResult<()> {
        conn.execute(
            &format!(
                "INSERT INTO triages ({TRIAGE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                self.patient_key,
                self.date,
                self.age,
                self.weight,
                self.height,
                self.temperature,
                self.blood_pressure,
                self.pulse,
                self.respiration,
                self.oxygen_saturation,
                self.labs_done,
                self.notes,
                self.last_updated,
            ],
        )?;
        Ok(())
    }

    fn overwrite(&self, conn: &Connection) -> DbResult<bool> {
        let rows_affected = conn.execute(
            r#"
            UPDATE triages SET
                age = ?3,
                weight = ?4,
                height = ?5,
                temperature = ?6,
                blood_pressure = ?7,
                pulse = ?8,
                respiration = ?9,
                oxygen_saturation = ?10,
                labs_done = ?11,
                notes = ?12,
                last_updated = ?13
            WHERE patient_key = ?1 AND date = ?2
            "#,
            params![
                self.patient_key,
                self.date,
                self.age,
                self.weight,
                self.height,
                self.temperature,
                self.blood_pressure,
                self.pulse,
                self.respiration,
                self.oxygen_saturation,
                self.labs_done,
                self.notes,
                self.last_updated,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}
