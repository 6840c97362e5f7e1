//! SOAP note database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DbResult, RecordTable};
use crate::models::{Soap, VisitKey};

const SOAP_COLUMNS: &str =
    "patient_key, date, subjective, objective, assessment, plan, wishlist, provider, last_updated";

fn soap_from_row(row: &Row<'_>) -> rusqlite::Result<Soap> {
    Ok(Soap {
        patient_key: row.get(0)?,
        date: row.get(1)?,
        subjective: row.get(2)?,
        objective: row.get(3)?,
        assessment: row.get(4)?,
        plan: row.get(5)?,
        wishlist: row.get(6)?,
        provider: row.get(7)?,
        last_updated: row.get(8)?,
    })
}

impl RecordTable for Soap {
    fn find(conn: &Connection, key: &VisitKey) -> DbResult<Option<Self>> {
        conn.query_row(
            &format!("SELECT {SOAP_COLUMNS} FROM soaps WHERE patient_key = ?1 AND date = ?2"),
            params![key.patient_key, key.date],
            soap_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn list_for_patient(conn: &Connection, patient_key: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SOAP_COLUMNS} FROM soaps WHERE patient_key = ? ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([patient_key], soap_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert(&self, conn: &Connection) -> DbResult<()> {
        conn.execute(
            &format!("INSERT INTO soaps ({SOAP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                self.patient_key,
                self.date,
                self.subjective,
                self.objective,
                self.assessment,
                self.plan,
                self.wishlist,
                self.provider,
                self.last_updated,
            ],
        )?;
        Ok(())
    }

    fn overwrite(&self, conn: &Connection) -> DbResult<bool> {
        let rows_affected = conn.execute(
            r#"
            UPDATE soaps SET
                subjective = ?3,
                objective = ?4,
                assessment = ?5,
                plan = ?6,
                wishlist = ?7,
                provider = ?8,
                last_updated = ?9
            WHERE patient_key = ?1 AND date = ?2
            "#,
            params![
                self.patient_key,
                self.date,
                self.subjective,
                self.objective,
                self.assessment,
                self.plan,
                self.wishlist,
                self.provider,
                self.last_updated,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}
