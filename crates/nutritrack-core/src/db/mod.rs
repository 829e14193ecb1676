//! SQLite store for the patient cohort.
//!
//! One [`Database`] owns one connection. Table access lives in per-table
//! `impl Database` blocks: `patients`, `food_intake`, `tips` and the
//! `app_state` key/value table holding the import guard and saved session.

mod schema;
mod patients;
mod food_intake;
mod tips;
mod app_state;

pub use schema::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use food_intake::*;
#[allow(unused_imports)]
pub use tips::*;
pub use app_state::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Store errors. `NotFound` is returned by updates against an absent id;
/// lookups return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// The patient store. Services borrow it as `&Database`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store file at `path`, creating it and its tables on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Open a private in-memory store. Nothing survives the handle.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create missing tables and seed `app_state`. Safe on every open.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Underlying connection, used for transactions spanning several tables.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientRecord, Sex};

    #[test]
    fn test_reopen_keeps_rows_and_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let db = Database::open(&path).unwrap();
            db.upsert_patient(&PatientRecord::new(3, Sex::Male, "0411111111".into()))
                .unwrap();
        }

        // Schema runs again on reopen without clobbering data
        let db = Database::open(&path).unwrap();
        assert_eq!(db.all_patient_ids().unwrap(), vec![3]);
        assert!(!db.is_patients_imported().unwrap());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"patients".to_string()));
        assert!(tables.contains(&"food_intake".to_string()));
        assert!(tables.contains(&"tips".to_string()));
        assert!(tables.contains(&"app_state".to_string()));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
