//! Food intake questionnaire submission.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{FoodIntakeProfile, FoodSelection, Session};
use crate::validation::{validate_food_selection, validate_routine, ValidationError};

#[derive(Error, Debug)]
pub enum QuestionnaireError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Answers as collected from the questionnaire form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionnaireAnswers {
    pub wake_time: String,
    pub biggest_meal_time: String,
    pub sleep_time: String,
    pub persona: String,
    pub foods: FoodSelection,
}

/// Validates and stores questionnaire answers for the session's patient.
pub struct Questionnaire<'a> {
    db: &'a Database,
}

impl<'a> Questionnaire<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Submit answers, replacing any earlier submission.
    ///
    /// The food selection is checked first, then the routine times. The store
    /// is untouched when either check fails.
    pub fn submit(
        &self,
        session: &Session,
        answers: QuestionnaireAnswers,
    ) -> Result<FoodIntakeProfile, QuestionnaireError> {
        validate_food_selection(&answers.foods)?;
        validate_routine(&answers.wake_time, &answers.biggest_meal_time, &answers.sleep_time)?;

        let profile = FoodIntakeProfile {
            patient_id: session.patient_id,
            sleep_time: answers.sleep_time.trim().to_string(),
            wake_time: answers.wake_time.trim().to_string(),
            biggest_meal_time: answers.biggest_meal_time.trim().to_string(),
            persona: answers.persona,
            foods: answers.foods,
        };
        self.db.replace_food_intake(&profile)?;

        tracing::info!(
            patient_id = session.patient_id,
            categories = profile.foods.selected().len(),
            "Questionnaire submitted"
        );
        Ok(profile)
    }

    pub fn load(&self, session: &Session) -> Result<Option<FoodIntakeProfile>, QuestionnaireError> {
        Ok(self.db.get_food_intake(session.patient_id)?)
    }

    /// Whether the patient has a stored questionnaire with at least one food
    /// category. Decides where a fresh login lands.
    pub fn has_completed(&self, session: &Session) -> Result<bool, QuestionnaireError> {
        Ok(self
            .load(session)?
            .map(|profile| profile.is_complete())
            .unwrap_or(false))
    }
}
