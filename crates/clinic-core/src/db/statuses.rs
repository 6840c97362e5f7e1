//! Visit status database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbResult, RecordTable};
use crate::models::{PatientSelectRow, Status, VisitKey};

const STATUS_COLUMNS: &str = "patient_key, date, name, birthday, checkin_time, \
     triage_completed, doctor_completed, pharmacy_completed, notes, active, last_updated";

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<Status> {
    Ok(Status {
        patient_key: row.get(0)?,
        date: row.get(1)?,
        name: row.get(2)?,
        birthday: row.get(3)?,
        checkin_time: row.get(4)?,
        triage_completed: row.get(5)?,
        doctor_completed: row.get(6)?,
        pharmacy_completed: row.get(7)?,
        notes: row.get(8)?,
        active: row.get(9)?,
        last_updated: row.get(10)?,
    })
}

impl RecordTable for Status {
    fn find(conn: &Connection, key: &VisitKey) -> DbResult<Option<Self>> {
        conn.query_row(
            &format!("SELECT {STATUS_COLUMNS} FROM statuses WHERE patient_key = ?1 AND date = ?2"),
            params![key.patient_key, key.date],
            status_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn list_for_patient(conn: &Connection, patient_key: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {STATUS_COLUMNS} FROM statuses WHERE patient_key = ? ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([patient_key], status_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert(&self, conn: &Connection) -> DbResult<()> {
        conn.execute(
            &format!(
                "INSERT INTO statuses ({STATUS_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                self.patient_key,
                self.date,
                self.name,
                self.birthday,
                self.checkin_time,
                self.triage_completed,
                self.doctor_completed,
                self.pharmacy_completed,
                self.notes,
                self.active,
                self.last_updated,
            ],
        )?;
        Ok(())
    }

    fn overwrite(&self, conn: &Connection) -> DbResult<bool> {
        let rows_affected = conn.execute(
            r#"
            UPDATE statuses SET
                name = ?3,
                birthday = ?4,
                checkin_time = ?5,
                triage_completed = ?6,
                doctor_completed = ?7,
                pharmacy_completed = ?8,
                notes = ?9,
                active = ?10,
                last_updated = ?11
            WHERE patient_key = ?1 AND date = ?2
            "#,
            params![
                self.patient_key,
                self.date,
                self.name,
                self.birthday,
                self.checkin_time,
                self.triage_completed,
                self.doctor_completed,
                self.pharmacy_completed,
                self.notes,
                self.active,
                self.last_updated,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Active visits on `date`, earliest check-in first.
pub fn select_rows_for_date(conn: &Connection, date: &str) -> DbResult<Vec<PatientSelectRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STATUS_COLUMNS} FROM statuses \
         WHERE date = ? AND active = 1 \
         ORDER BY checkin_time, rowid"
    ))?;
    let rows = stmt.query_map([date], status_from_row)?;

    let mut select_rows = Vec::new();
    for status in rows {
        select_rows.push(PatientSelectRow::from(&status?));
    }
    Ok(select_rows)
}
