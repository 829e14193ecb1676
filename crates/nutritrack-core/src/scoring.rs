//! Total scores, cohort averages and the fruit-score what-if path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{PatientRecord, ScoreCategory, Sex, MAX_TOTAL_SCORE};
use crate::validation::ValidationError;

/// Scoring errors.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type ScoreResult<T> = Result<T, ScoreError>;

/// Where a patient's total score is read from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TotalScoreSource {
    /// The precomputed total imported from the dataset
    #[default]
    Stored,
    /// The sum of the thirteen sub-scores
    Derived,
}

/// What a single sub-score edit does to the stored total.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FruitEditPolicy {
    /// Leave the stored total alone; it diverges until the next reconciliation
    #[default]
    Sandbox,
    /// Recompute the stored total from the sub-scores in the same transaction
    Cascade,
}

/// Scoring behaviour switches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringConfig {
    pub total_source: TotalScoreSource,
    pub fruit_edit: FruitEditPolicy,
}

/// A patient's total score according to `source`.
pub fn total_score(patient: &PatientRecord, source: TotalScoreSource) -> f64 {
    match source {
        TotalScoreSource::Stored => patient.total_score,
        TotalScoreSource::Derived => patient.derived_total(),
    }
}

/// Mean score per requested group.
///
/// A record belongs to a group when `key` matches the group name
/// case-insensitively. Groups with no members average to `0.0`.
pub fn average_by_group<K, S>(
    records: &[PatientRecord],
    groups: &[&str],
    key: K,
    score: S,
) -> BTreeMap<String, f64>
where
    K: Fn(&PatientRecord) -> String,
    S: Fn(&PatientRecord) -> f64,
{
    groups
        .iter()
        .map(|group| {
            let members: Vec<f64> = records
                .iter()
                .filter(|r| key(r).trim().eq_ignore_ascii_case(group.trim()))
                .map(|r| score(r))
                .collect();
            (group.to_string(), mean(&members))
        })
        .collect()
}

/// Average total score by sex.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SexAverages {
    pub male: f64,
    pub female: f64,
}

/// Average total score of male and female patients.
pub fn average_by_sex(records: &[PatientRecord], source: TotalScoreSource) -> SexAverages {
    let averages = average_by_group(
        records,
        &[Sex::Male.as_str(), Sex::Female.as_str()],
        |r| r.sex.as_str().to_string(),
        |r| total_score(r, source),
    );
    SexAverages {
        male: averages.get(Sex::Male.as_str()).copied().unwrap_or_default(),
        female: averages.get(Sex::Female.as_str()).copied().unwrap_or_default(),
    }
}

/// Mean over the whole cohort, `0.0` when empty.
pub fn cohort_average(records: &[PatientRecord], source: TotalScoreSource) -> f64 {
    let scores: Vec<f64> = records.iter().map(|r| total_score(r, source)).collect();
    mean(&scores)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Plain-text summary of a patient's scores for sharing.
pub fn insights_share_text(patient: &PatientRecord, source: TotalScoreSource) -> String {
    let mut text = String::from("Nutritional Insights\n\n");
    for (category, score) in patient.scores.iter() {
        text.push_str(&format!(
            "{}: {:.2}/{:.0}\n",
            category.label(),
            score,
            category.max_score()
        ));
    }
    text.push_str(&format!(
        "\nOverall Food Quality Score: {:.2} / {:.0}\n",
        total_score(patient, source),
        MAX_TOTAL_SCORE
    ));
    text
}

/// Narrow update path for the fruit sub-score.
pub struct FruitScoreUpdater<'a> {
    db: &'a Database,
    policy: FruitEditPolicy,
}

impl<'a> FruitScoreUpdater<'a> {
    pub fn new(db: &'a Database, policy: FruitEditPolicy) -> Self {
        Self { db, policy }
    }

    /// Set a patient's fruit score, clamped to `[0, 10]`.
    ///
    /// Under [`FruitEditPolicy::Sandbox`] the stored total is not touched.
    /// Fails with `NotFound` for an unknown patient, writing nothing.
    pub fn set_fruit_score(&self, patient_id: i64, value: f64) -> ScoreResult<PatientRecord> {
        if value.is_nan() {
            return Err(ValidationError::InvalidScore(value).into());
        }
        let value = value.clamp(0.0, ScoreCategory::Fruit.max_score());

        match self.policy {
            FruitEditPolicy::Sandbox => {
                self.db.patch_score(patient_id, ScoreCategory::Fruit, value)?;
            }
            FruitEditPolicy::Cascade => {
                let tx = self.db.conn().unchecked_transaction().map_err(DbError::from)?;
                self.db.patch_score(patient_id, ScoreCategory::Fruit, value)?;
                let patient = self
                    .db
                    .get_patient(patient_id)?
                    .ok_or_else(|| DbError::NotFound(format!("patient {}", patient_id)))?;
                self.db.set_total_score(patient_id, patient.derived_total())?;
                tx.commit().map_err(DbError::from)?;
            }
        }
        tracing::debug!(patient_id, value, policy = ?self.policy, "Fruit score updated");

        self.db
            .get_patient(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient_id)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_patient(id: i64, sex: Sex, total: f64) -> PatientRecord {
        let mut patient = PatientRecord::new(id, sex, "04".into());
        patient.total_score = total;
        patient.scores.fruit = 5.0;
        patient.scores.vegetables = 5.0;
        patient
    }

    #[test]
    fn test_total_score_sources() {
        let patient = make_patient(1, Sex::Male, 64.0);
        assert_eq!(total_score(&patient, TotalScoreSource::Stored), 64.0);
        assert_eq!(total_score(&patient, TotalScoreSource::Derived), 10.0);
    }

    #[test]
    fn test_average_by_sex() {
        let records = vec![
            make_patient(1, Sex::Male, 60.0),
            make_patient(2, Sex::Female, 70.0),
            make_patient(3, Sex::Male, 40.0),
        ];
        let averages = average_by_sex(&records, TotalScoreSource::Stored);
        assert_eq!(averages, SexAverages { male: 50.0, female: 70.0 });
    }

    #[test]
    fn test_empty_group_is_zero() {
        let records = vec![make_patient(1, Sex::Male, 60.0)];
        let averages = average_by_sex(&records, TotalScoreSource::Stored);
        assert_eq!(averages.female, 0.0);
        assert_eq!(average_by_sex(&[], TotalScoreSource::Derived), SexAverages::default());
        assert_eq!(cohort_average(&[], TotalScoreSource::Stored), 0.0);
    }

    #[test]
    fn test_group_keys_case_insensitive() {
        let records = vec![make_patient(1, Sex::Male, 60.0), make_patient(2, Sex::Male, 62.0)];
        let averages = average_by_group(
            &records,
            &["MALE", "female", "other"],
            |r| r.sex.as_str().to_lowercase(),
            |r| r.total_score,
        );
        assert_eq!(averages["MALE"], 61.0);
        assert_eq!(averages["female"], 0.0);
        assert_eq!(averages["other"], 0.0);
    }

    #[test]
    fn test_share_text() {
        let patient = make_patient(1, Sex::Female, 72.5);
        let text = insights_share_text(&patient, TotalScoreSource::Stored);
        assert!(text.contains("Fruits: 5.00/10\n"));
        assert!(text.contains("Water: 0.00/5\n"));
        assert!(text.contains("Overall Food Quality Score: 72.50 / 100"));
    }

    #[test]
    fn test_scoring_config_from_json() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"fruit_edit": "cascade"}"#).unwrap();
        assert_eq!(config.fruit_edit, FruitEditPolicy::Cascade);
        assert_eq!(config.total_source, TotalScoreSource::Stored);
    }

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_patient(&make_patient(1, Sex::Male, 64.0)).unwrap();
        db
    }

    #[test]
    fn test_sandbox_leaves_total() {
        let db = setup_db();
        let updater = FruitScoreUpdater::new(&db, FruitEditPolicy::Sandbox);

        let patient = updater.set_fruit_score(1, 10.0).unwrap();
        assert_eq!(patient.scores.fruit, 10.0);
        assert_eq!(patient.scores.vegetables, 5.0);
        assert_eq!(patient.total_score, 64.0);
    }

    #[test]
    fn test_cascade_recomputes_total() {
        let db = setup_db();
        let updater = FruitScoreUpdater::new(&db, FruitEditPolicy::Cascade);

        let patient = updater.set_fruit_score(1, 10.0).unwrap();
        assert_eq!(patient.scores.fruit, 10.0);
        assert_eq!(patient.total_score, 15.0);
        assert_eq!(patient.total_score, patient.derived_total());
    }

    #[test]
    fn test_fruit_score_clamped() {
        let db = setup_db();
        let updater = FruitScoreUpdater::new(&db, FruitEditPolicy::Sandbox);

        assert_eq!(updater.set_fruit_score(1, 12.0).unwrap().scores.fruit, 10.0);
        assert_eq!(updater.set_fruit_score(1, -3.0).unwrap().scores.fruit, 0.0);
        assert!(matches!(
            updater.set_fruit_score(1, f64::NAN),
            Err(ScoreError::Validation(ValidationError::InvalidScore(_)))
        ));
    }

    #[test]
    fn test_fruit_score_unknown_patient() {
        let db = setup_db();
        for policy in [FruitEditPolicy::Sandbox, FruitEditPolicy::Cascade] {
            let updater = FruitScoreUpdater::new(&db, policy);
            assert!(matches!(
                updater.set_fruit_score(99, 4.0),
                Err(ScoreError::Database(DbError::NotFound(_)))
            ));
        }
        assert_eq!(db.count_patients().unwrap(), 1);
    }

    proptest! {
        #[test]
        fn prop_single_member_group_exact(total in 0.0f64..=100.0) {
            let records = vec![make_patient(1, Sex::Female, total)];
            let averages = average_by_sex(&records, TotalScoreSource::Stored);
            prop_assert_eq!(averages.female, total);
            prop_assert_eq!(averages.male, 0.0);
        }
    }
}
