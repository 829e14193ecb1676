//! Key/value app state: import guard and persisted login session.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Session;

pub const KEY_PATIENTS_IMPORTED: &str = "patients_imported";
pub const KEY_PATIENTS_IMPORT_DIGEST: &str = "patients_import_digest";
pub const KEY_SESSION: &str = "session";

impl Database {
    /// Get app state value.
    pub fn get_app_state(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Set app state value.
    pub fn set_app_state(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value, updated_at) VALUES (?, ?, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove an app state value.
    pub fn clear_app_state(&self, key: &str) -> DbResult<()> {
        self.conn
            .execute("DELETE FROM app_state WHERE key = ?", [key])?;
        Ok(())
    }

    /// Whether the patient dataset has already been imported.
    pub fn is_patients_imported(&self) -> DbResult<bool> {
        Ok(self.get_app_state(KEY_PATIENTS_IMPORTED)?.as_deref() == Some("true"))
    }

    /// Mark the dataset imported, remembering the digest of its contents.
    pub fn mark_patients_imported(&self, digest: &str) -> DbResult<()> {
        self.set_app_state(KEY_PATIENTS_IMPORTED, "true")?;
        self.set_app_state(KEY_PATIENTS_IMPORT_DIGEST, digest)
    }

    /// Digest of the last imported dataset, if any.
    pub fn patients_import_digest(&self) -> DbResult<Option<String>> {
        Ok(self
            .get_app_state(KEY_PATIENTS_IMPORT_DIGEST)?
            .filter(|d| !d.is_empty()))
    }

    /// Persist the current login session.
    pub fn save_session(&self, session: &Session) -> DbResult<()> {
        let json = serde_json::to_string(session)?;
        self.set_app_state(KEY_SESSION, &json)
    }

    /// Load the persisted login session, if any.
    pub fn load_session(&self) -> DbResult<Option<Session>> {
        self.get_app_state(KEY_SESSION)?
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    /// Forget the persisted login session.
    pub fn clear_session(&self) -> DbResult<()> {
        self.clear_app_state(KEY_SESSION)
    }
}
