//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{PatientRecord, RegistrationState, ScoreCategory, Sex, SubScores};

const PATIENT_COLUMNS: &str = r#"
    patient_id, sex, phone_number, name, password_digest, total_score,
    discretionary_foods, vegetables, fruit, grains_and_cereals, whole_grains,
    meat_and_alternatives, dairy_and_alternatives, water, saturated_fat,
    unsaturated_fat, sodium, sugar, alcohol
"#;

/// Raw row from the patients table.
struct PatientRow {
    patient_id: i64,
    sex: String,
    phone_number: String,
    name: Option<String>,
    password_digest: Option<String>,
    total_score: f64,
    scores: [f64; 13],
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut scores = [0.0; 13];
        for (i, slot) in scores.iter_mut().enumerate() {
            *slot = row.get(6 + i)?;
        }
        Ok(Self {
            patient_id: row.get(0)?,
            sex: row.get(1)?,
            phone_number: row.get(2)?,
            name: row.get(3)?,
            password_digest: row.get(4)?,
            total_score: row.get(5)?,
            scores,
        })
    }
}

impl TryFrom<PatientRow> for PatientRecord {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let sex = Sex::parse(&row.sex)
            .ok_or_else(|| DbError::Constraint(format!("Unknown sex: {}", row.sex)))?;

        let registration = match (row.name, row.password_digest) {
            (Some(name), Some(password_digest)) => RegistrationState::Claimed {
                name,
                password_digest,
            },
            _ => RegistrationState::Unclaimed,
        };

        let mut scores = SubScores::default();
        for (category, value) in ScoreCategory::ALL.iter().zip(row.scores) {
            scores.set(*category, value);
        }

        Ok(PatientRecord {
            patient_id: row.patient_id,
            sex,
            phone_number: row.phone_number,
            registration,
            scores,
            total_score: row.total_score,
        })
    }
}

fn registration_columns(state: &RegistrationState) -> (Option<&str>, Option<&str>) {
    match state {
        RegistrationState::Claimed {
            name,
            password_digest,
        } => (Some(name.as_str()), Some(password_digest.as_str())),
        RegistrationState::Unclaimed => (None, None),
    }
}

impl Database {
    /// Insert a patient, or replace every field of the existing one.
    pub fn upsert_patient(&self, patient: &PatientRecord) -> DbResult<()> {
        let (name, password_digest) = registration_columns(&patient.registration);
        let s = &patient.scores;

        self.conn.execute(
            r#"
            INSERT INTO patients (
                patient_id, sex, phone_number, name, password_digest, total_score,
                discretionary_foods, vegetables, fruit, grains_and_cereals, whole_grains,
                meat_and_alternatives, dairy_and_alternatives, water, saturated_fat,
                unsaturated_fat, sodium, sugar, alcohol, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, datetime('now'))
            ON CONFLICT(patient_id) DO UPDATE SET
                sex = excluded.sex,
                phone_number = excluded.phone_number,
                name = excluded.name,
                password_digest = excluded.password_digest,
                total_score = excluded.total_score,
                discretionary_foods = excluded.discretionary_foods,
                vegetables = excluded.vegetables,
                fruit = excluded.fruit,
                grains_and_cereals = excluded.grains_and_cereals,
                whole_grains = excluded.whole_grains,
                meat_and_alternatives = excluded.meat_and_alternatives,
                dairy_and_alternatives = excluded.dairy_and_alternatives,
                water = excluded.water,
                saturated_fat = excluded.saturated_fat,
                unsaturated_fat = excluded.unsaturated_fat,
                sodium = excluded.sodium,
                sugar = excluded.sugar,
                alcohol = excluded.alcohol,
                updated_at = datetime('now')
            "#,
            params![
                patient.patient_id,
                patient.sex.as_str(),
                patient.phone_number,
                name,
                password_digest,
                patient.total_score,
                s.discretionary_foods,
                s.vegetables,
                s.fruit,
                s.grains_and_cereals,
                s.whole_grains,
                s.meat_and_alternatives,
                s.dairy_and_alternatives,
                s.water,
                s.saturated_fat,
                s.unsaturated_fat,
                s.sodium,
                s.sugar,
                s.alcohol,
            ],
        )?;
        Ok(())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: i64) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?"),
                [patient_id],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a patient by phone number.
    pub fn get_patient_by_phone_number(&self, phone_number: &str) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {PATIENT_COLUMNS} FROM patients WHERE phone_number = ? ORDER BY patient_id LIMIT 1"
                ),
                [phone_number],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Snapshot of every patient, ordered by ID.
    pub fn list_patients(&self) -> DbResult<Vec<PatientRecord>> {
        self.query_patients(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY patient_id"),
            [],
        )
    }

    /// Patients of one sex, ordered by ID.
    pub fn list_patients_by_sex(&self, sex: Sex) -> DbResult<Vec<PatientRecord>> {
        self.query_patients(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE sex = ? ORDER BY patient_id"),
            [sex.as_str()],
        )
    }

    /// Patients that are (or are not) registered.
    pub fn list_patients_by_registration(&self, registered: bool) -> DbResult<Vec<PatientRecord>> {
        let sql = if registered {
            format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE password_digest IS NOT NULL ORDER BY patient_id")
        } else {
            format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE password_digest IS NULL ORDER BY patient_id")
        };
        self.query_patients(&sql, [])
    }

    /// Patients matching an arbitrary predicate, taken from a snapshot.
    pub fn filter_patients<F>(&self, predicate: F) -> DbResult<Vec<PatientRecord>>
    where
        F: Fn(&PatientRecord) -> bool,
    {
        Ok(self
            .list_patients()?
            .into_iter()
            .filter(|p| predicate(p))
            .collect())
    }

    /// IDs of every patient.
    pub fn all_patient_ids(&self) -> DbResult<Vec<i64>> {
        self.query_ids("SELECT patient_id FROM patients ORDER BY patient_id")
    }

    /// IDs of claimed patients (offered on the login screen).
    pub fn registered_patient_ids(&self) -> DbResult<Vec<i64>> {
        self.query_ids(
            "SELECT patient_id FROM patients WHERE password_digest IS NOT NULL ORDER BY patient_id",
        )
    }

    /// Number of patients in the store.
    pub fn count_patients(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Update a single sub-score. Never creates a patient.
    pub fn patch_score(&self, patient_id: i64, category: ScoreCategory, value: f64) -> DbResult<()> {
        let sql = format!(
            "UPDATE patients SET {} = ?2, updated_at = datetime('now') WHERE patient_id = ?1",
            category.db_column()
        );
        let rows_affected = self.conn.execute(&sql, params![patient_id, value])?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("patient {}", patient_id)));
        }
        Ok(())
    }

    /// Overwrite the stored total of one patient.
    pub fn set_total_score(&self, patient_id: i64, total_score: f64) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET total_score = ?2, updated_at = datetime('now') WHERE patient_id = ?1",
            params![patient_id, total_score],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("patient {}", patient_id)));
        }
        Ok(())
    }

    /// Rewrite every stored total as the sum of its sub-scores.
    ///
    /// Returns the number of patients whose total changed.
    pub fn reconcile_total_scores(&self) -> DbResult<usize> {
        let derived = ScoreCategory::ALL
            .iter()
            .map(|c| c.db_column())
            .collect::<Vec<_>>()
            .join(" + ");
        let sql = format!(
            "UPDATE patients SET total_score = {derived}, updated_at = datetime('now') \
             WHERE total_score IS NOT ({derived})"
        );
        Ok(self.conn.execute(&sql, [])?)
    }

    /// Record a claim on an unclaimed patient.
    pub fn claim_patient(&self, patient_id: i64, name: &str, password_digest: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                password_digest = ?3,
                updated_at = datetime('now')
            WHERE patient_id = ?1 AND password_digest IS NULL
            "#,
            params![patient_id, name, password_digest],
        )?;
        if rows_affected == 0 {
            return match self.get_patient(patient_id)? {
                Some(_) => Err(DbError::Constraint(format!(
                    "patient {} is already registered",
                    patient_id
                ))),
                None => Err(DbError::NotFound(format!("patient {}", patient_id))),
            };
        }
        Ok(())
    }

    fn query_patients<P: rusqlite::Params>(&self, sql: &str, params: P) -> DbResult<Vec<PatientRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, PatientRow::from_row)?;

        let mut patients: Vec<PatientRecord> = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    fn query_ids(&self, sql: &str) -> DbResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::password_digest_for;
    use proptest::prelude::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_patient(id: i64, sex: Sex, fruit: f64) -> PatientRecord {
        let mut patient = PatientRecord::new(id, sex, format!("04000000{:02}", id));
        patient.scores.fruit = fruit;
        patient.scores.vegetables = 6.5;
        patient.total_score = fruit + 6.5;
        patient
    }

    #[test]
    fn test_upsert_and_get() {
        let db = setup_db();

        let patient = make_patient(1, Sex::Male, 7.0);
        db.upsert_patient(&patient).unwrap();

        let retrieved = db.get_patient(1).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_upsert_replaces_fields() {
        let db = setup_db();

        let mut patient = make_patient(1, Sex::Male, 7.0);
        db.upsert_patient(&patient).unwrap();

        patient.phone_number = "0499999999".into();
        patient.scores.fruit = 3.0;
        db.upsert_patient(&patient).unwrap();

        assert_eq!(db.count_patients().unwrap(), 1);
        let retrieved = db.get_patient(1).unwrap().unwrap();
        assert_eq!(retrieved.phone_number, "0499999999");
        assert_eq!(retrieved.scores.fruit, 3.0);
    }

    #[test]
    fn test_get_missing_patient() {
        let db = setup_db();
        assert!(db.get_patient(404).unwrap().is_none());
    }

    #[test]
    fn test_list_by_sex_and_filter() {
        let db = setup_db();
        db.upsert_patient(&make_patient(1, Sex::Male, 7.0)).unwrap();
        db.upsert_patient(&make_patient(2, Sex::Female, 9.0)).unwrap();
        db.upsert_patient(&make_patient(3, Sex::Female, 2.0)).unwrap();

        let females = db.list_patients_by_sex(Sex::Female).unwrap();
        assert_eq!(females.len(), 2);
        assert!(females.iter().all(|p| p.sex == Sex::Female));

        let high_fruit = db.filter_patients(|p| p.scores.fruit > 5.0).unwrap();
        let ids: Vec<i64> = high_fruit.iter().map(|p| p.patient_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_patch_score() {
        let db = setup_db();
        let patient = make_patient(1, Sex::Male, 7.0);
        db.upsert_patient(&patient).unwrap();

        db.patch_score(1, ScoreCategory::Fruit, 10.0).unwrap();

        let retrieved = db.get_patient(1).unwrap().unwrap();
        assert_eq!(retrieved.scores.fruit, 10.0);
        assert_eq!(retrieved.scores.vegetables, 6.5);
        assert_eq!(retrieved.total_score, patient.total_score);
    }

    #[test]
    fn test_patch_score_missing_patient() {
        let db = setup_db();

        let result = db.patch_score(99, ScoreCategory::Fruit, 4.0);
        assert!(matches!(result, Err(DbError::NotFound(_))));
        assert_eq!(db.count_patients().unwrap(), 0);
    }

    #[test]
    fn test_reconcile_total_scores() {
        let db = setup_db();
        let mut patient = make_patient(1, Sex::Male, 7.0);
        patient.total_score = 50.0;
        db.upsert_patient(&patient).unwrap();
        db.upsert_patient(&make_patient(2, Sex::Female, 1.0)).unwrap();

        let changed = db.reconcile_total_scores().unwrap();
        assert_eq!(changed, 1);

        let retrieved = db.get_patient(1).unwrap().unwrap();
        assert_eq!(retrieved.total_score, retrieved.derived_total());
    }

    #[test]
    fn test_claim_patient() {
        let db = setup_db();
        db.upsert_patient(&make_patient(1, Sex::Male, 7.0)).unwrap();
        db.upsert_patient(&make_patient(2, Sex::Female, 9.0)).unwrap();
        assert!(db.registered_patient_ids().unwrap().is_empty());

        let digest = password_digest_for(1, "pass1");
        db.claim_patient(1, "Alex", &digest).unwrap();

        let retrieved = db.get_patient(1).unwrap().unwrap();
        assert_eq!(retrieved.registration.name(), Some("Alex"));
        assert!(retrieved.verify_password("pass1"));
        assert_eq!(db.registered_patient_ids().unwrap(), vec![1]);
        assert_eq!(db.list_patients_by_registration(false).unwrap().len(), 1);
        assert_eq!(db.all_patient_ids().unwrap(), vec![1, 2]);

        // Second claim is refused
        let result = db.claim_patient(1, "Sam", &digest);
        assert!(matches!(result, Err(DbError::Constraint(_))));

        let result = db.claim_patient(3, "Sam", &digest);
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_get_by_phone_number() {
        let db = setup_db();
        db.upsert_patient(&make_patient(5, Sex::Female, 4.0)).unwrap();

        let found = db.get_patient_by_phone_number("0400000005").unwrap().unwrap();
        assert_eq!(found.patient_id, 5);
        assert!(db.get_patient_by_phone_number("nope").unwrap().is_none());
    }

    #[test]
    fn test_claimed_record_round_trips() {
        let db = setup_db();
        let mut patient = make_patient(4, Sex::Female, 9.5);
        patient.registration = RegistrationState::Claimed {
            name: "Sam".into(),
            password_digest: password_digest_for(4, "pass12"),
        };

        db.upsert_patient(&patient).unwrap();
        assert_eq!(db.get_patient(4).unwrap(), Some(patient));
    }

    fn arb_patient() -> impl Strategy<Value = PatientRecord> {
        (
            1i64..100_000,
            prop::bool::ANY,
            "[0-9]{10}",
            prop::collection::vec(0.0f64..=1.0, ScoreCategory::ALL.len()),
            0.0f64..=100.0,
            prop::option::of(("[A-Za-z]{1,8}", "[A-Za-z0-9]{4,8}")),
        )
            .prop_map(|(id, male, phone, fractions, total, claim)| {
                let sex = if male { Sex::Male } else { Sex::Female };
                let mut patient = PatientRecord::new(id, sex, phone);
                for (category, fraction) in ScoreCategory::ALL.iter().zip(fractions) {
                    patient.scores.set(*category, category.max_score() * fraction);
                }
                patient.total_score = total;
                if let Some((name, password)) = claim {
                    patient.registration = RegistrationState::Claimed {
                        name,
                        password_digest: password_digest_for(id, &password),
                    };
                }
                patient
            })
    }

    proptest! {
        #[test]
        fn prop_upsert_then_get_returns_record(patient in arb_patient()) {
            let db = setup_db();
            db.upsert_patient(&patient).unwrap();
            prop_assert_eq!(db.get_patient(patient.patient_id).unwrap(), Some(patient));
        }
    }
}
