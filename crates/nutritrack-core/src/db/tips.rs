//! NutriCoach tip database operations.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::Tip;

impl Database {
    /// Append a tip for a patient, returning its ID.
    pub fn insert_tip(&self, patient_id: i64, message: &str) -> DbResult<i64> {
        self.conn.execute(
            "INSERT INTO tips (patient_id, message, created_at) VALUES (?, ?, ?)",
            params![patient_id, message, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All tips for a patient, oldest first.
    pub fn list_tips(&self, patient_id: i64) -> DbResult<Vec<Tip>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tip_id, patient_id, message, created_at
            FROM tips
            WHERE patient_id = ?
            ORDER BY tip_id
            "#,
        )?;

        let rows = stmt.query_map([patient_id], |row| {
            Ok(Tip {
                tip_id: row.get(0)?,
                patient_id: row.get(1)?,
                message: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
