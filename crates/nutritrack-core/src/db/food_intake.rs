//! Food intake questionnaire database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{FoodIntakeProfile, FoodSelection};

impl Database {
    /// Store a questionnaire, replacing any previous answers for the patient.
    ///
    /// Callers validate the times first; this only writes.
    pub fn replace_food_intake(&self, profile: &FoodIntakeProfile) -> DbResult<()> {
        let f = &profile.foods;
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO food_intake (
                patient_id, sleep_time, wake_time, biggest_meal_time, persona,
                intake_fruits, intake_vegetables, intake_grains, intake_red_meat,
                intake_seafood, intake_poultry, intake_fish, intake_eggs,
                intake_nuts_or_seeds, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, datetime('now'))
            "#,
            params![
                profile.patient_id,
                profile.sleep_time,
                profile.wake_time,
                profile.biggest_meal_time,
                profile.persona,
                f.fruits,
                f.vegetables,
                f.grains,
                f.red_meat,
                f.seafood,
                f.poultry,
                f.fish,
                f.eggs,
                f.nuts_or_seeds,
            ],
        )?;
        Ok(())
    }

    /// Get the questionnaire answers of a patient.
    pub fn get_food_intake(&self, patient_id: i64) -> DbResult<Option<FoodIntakeProfile>> {
        self.conn
            .query_row(
                r#"
                SELECT patient_id, sleep_time, wake_time, biggest_meal_time, persona,
                       intake_fruits, intake_vegetables, intake_grains, intake_red_meat,
                       intake_seafood, intake_poultry, intake_fish, intake_eggs,
                       intake_nuts_or_seeds
                FROM food_intake
                WHERE patient_id = ?
                "#,
                [patient_id],
                |row| {
                    Ok(FoodIntakeProfile {
                        patient_id: row.get(0)?,
                        sleep_time: row.get(1)?,
                        wake_time: row.get(2)?,
                        biggest_meal_time: row.get(3)?,
                        persona: row.get(4)?,
                        foods: FoodSelection {
                            fruits: row.get(5)?,
                            vegetables: row.get(6)?,
                            grains: row.get(7)?,
                            red_meat: row.get(8)?,
                            seafood: row.get(9)?,
                            poultry: row.get(10)?,
                            fish: row.get(11)?,
                            eggs: row.get(12)?,
                            nuts_or_seeds: row.get(13)?,
                        },
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::{FoodCategory, PatientRecord, Sex};

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_patient(&PatientRecord::new(1, Sex::Female, "0400000001".into()))
            .unwrap();
        db
    }

    fn make_profile(persona: &str, foods: &[FoodCategory]) -> FoodIntakeProfile {
        FoodIntakeProfile {
            patient_id: 1,
            sleep_time: "23:00".into(),
            wake_time: "07:00".into(),
            biggest_meal_time: "12:30".into(),
            persona: persona.into(),
            foods: FoodSelection::from_categories(foods),
        }
    }

    #[test]
    fn test_replace_and_get() {
        let db = setup_db();
        let profile = make_profile("Health Devotee", &[FoodCategory::Fruits, FoodCategory::Fish]);

        db.replace_food_intake(&profile).unwrap();

        let retrieved = db.get_food_intake(1).unwrap().unwrap();
        assert_eq!(retrieved, profile);
    }

    #[test]
    fn test_replace_overwrites_wholesale() {
        let db = setup_db();
        db.replace_food_intake(&make_profile("Health Devotee", &[FoodCategory::Fruits]))
            .unwrap();
        db.replace_food_intake(&make_profile("Foodie", &[FoodCategory::Eggs]))
            .unwrap();

        let retrieved = db.get_food_intake(1).unwrap().unwrap();
        assert_eq!(retrieved.persona, "Foodie");
        assert!(!retrieved.foods.fruits);
        assert!(retrieved.foods.eggs);
    }

    #[test]
    fn test_unknown_patient_rejected() {
        let db = setup_db();
        let mut profile = make_profile("Foodie", &[FoodCategory::Eggs]);
        profile.patient_id = 77;

        let result = db.replace_food_intake(&profile);
        assert!(matches!(result, Err(DbError::Sqlite(_))));
        assert!(db.get_food_intake(77).unwrap().is_none());
    }
}
