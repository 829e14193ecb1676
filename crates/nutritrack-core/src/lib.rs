//! NutriTrack Core Library
//!
//! Local patient store for HEIFA (Healthy Eating Index for Australian Adults)
//! diet-quality scores, seeded once from a reference dataset.
//!
//! # Architecture
//!
//! ```text
//! Dataset text ──► Header ──► Row Parser ──► Patient Store (SQLite)
//!                                                  │
//!                         [app_state: patients_imported]
//!                                                  │
//!            ┌─────────────────┬───────────────────┼────────────────────┐
//!            │                 │                   │                    │
//!            ▼                 ▼                   ▼                    ▼
//!        Accounts        Questionnaire      Score Aggregator    Fruit-Score Updater
//!   (claim, login,     (temporal order        (averages by        (Sandbox or
//!     session)          validation)              sex)               Cascade)
//! ```
//!
//! # Core Principle
//!
//! **The dataset is imported once.** Later launches find the persisted flag
//! and leave the store alone; a changed dataset is reported, not re-read.
//!
//! # Modules
//!
//! - [`db`]: SQLite patient store and key/value app state
//! - [`models`]: Domain types (PatientRecord, SubScores, FoodIntakeProfile, Session)
//! - [`import`]: Header mapping, row parsing and the one-shot import coordinator
//! - [`validation`]: Pre-write gates for questionnaire and registration input
//! - [`scoring`]: Totals, cohort averages and the fruit-score update path
//! - [`accounts`]: Registration, login and session persistence
//! - [`questionnaire`]: Food intake submission
//! - [`config`]: Engine configuration

pub mod accounts;
pub mod config;
pub mod db;
pub mod import;
pub mod models;
pub mod questionnaire;
pub mod scoring;
pub mod validation;

// Re-export commonly used types
pub use accounts::{Accounts, AuthError, ClaimRequest};
pub use config::{ConfigError, EngineConfig};
pub use db::Database;
pub use import::{ImportCoordinator, ImportError, ImportOutcome, ImportReport};
pub use models::{
    FoodCategory, FoodIntakeProfile, FoodSelection, PatientRecord, RegistrationState,
    ScoreCategory, Session, Sex, SubScores, Tip,
};
pub use questionnaire::{Questionnaire, QuestionnaireAnswers, QuestionnaireError};
pub use scoring::{FruitEditPolicy, FruitScoreUpdater, ScoringConfig, SexAverages, TotalScoreSource};
pub use validation::ValidationError;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NutriTrackError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for NutriTrackError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => NutriTrackError::NotFound(what),
            other => NutriTrackError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ValidationError> for NutriTrackError {
    fn from(e: ValidationError) -> Self {
        NutriTrackError::InvalidInput(e.to_string())
    }
}

impl From<ImportError> for NutriTrackError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Database(db) => db.into(),
            other => NutriTrackError::ImportError(other.to_string()),
        }
    }
}

impl From<scoring::ScoreError> for NutriTrackError {
    fn from(e: scoring::ScoreError) -> Self {
        match e {
            scoring::ScoreError::Database(db) => db.into(),
            scoring::ScoreError::Validation(v) => v.into(),
        }
    }
}

impl From<AuthError> for NutriTrackError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Database(db) => db.into(),
            AuthError::Validation(v) => v.into(),
            other => NutriTrackError::AuthenticationError(other.to_string()),
        }
    }
}

impl From<QuestionnaireError> for NutriTrackError {
    fn from(e: QuestionnaireError) -> Self {
        match e {
            QuestionnaireError::Database(db) => db.into(),
            QuestionnaireError::Validation(v) => v.into(),
        }
    }
}

impl From<ConfigError> for NutriTrackError {
    fn from(e: ConfigError) -> Self {
        NutriTrackError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for NutriTrackError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        NutriTrackError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_engine(path: String) -> Result<Arc<NutriTrackCore>, NutriTrackError> {
    let config = EngineConfig {
        database_path: path.into(),
        ..EngineConfig::default()
    };
    NutriTrackCore::open(config)
}

/// Open the engine described by a JSON config, with environment overrides.
#[uniffi::export]
pub fn open_engine_with_config(config_json: String) -> Result<Arc<NutriTrackCore>, NutriTrackError> {
    let config =
        EngineConfig::from_json_str(&config_json)?.with_overrides(|key| std::env::var(key).ok());
    NutriTrackCore::open(config)
}

/// Create an in-memory engine (for testing).
#[uniffi::export]
pub fn open_engine_in_memory() -> Result<Arc<NutriTrackCore>, NutriTrackError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(NutriTrackCore {
        db: Arc::new(Mutex::new(db)),
        config: EngineConfig::default(),
    }))
}

/// Whether wake, biggest meal and sleep (`HH:MM`) occur in that order.
#[uniffi::export]
pub fn is_valid_time_order(wake: String, meal: String, sleep: String) -> bool {
    validation::is_valid_order(&wake, &meal, &sleep)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine wrapper for FFI.
#[derive(uniffi::Object)]
pub struct NutriTrackCore {
    db: Arc<Mutex<Database>>,
    config: EngineConfig,
}

impl NutriTrackCore {
    fn open(config: EngineConfig) -> Result<Arc<Self>, NutriTrackError> {
        let db = Database::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "Opened patient store");
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }
}

#[uniffi::export]
impl NutriTrackCore {
    // =========================================================================
    // Import Operations
    // =========================================================================

    /// Import dataset text on first launch; later calls are skipped.
    pub fn import_dataset(&self, csv: String) -> Result<FfiImportSummary, NutriTrackError> {
        let db = self.db.lock()?;
        let outcome = ImportCoordinator::new(&db).run(&csv)?;
        Ok(outcome.into())
    }

    /// Import the dataset file named in the config on first launch.
    pub fn import_configured_dataset(&self) -> Result<FfiImportSummary, NutriTrackError> {
        let db = self.db.lock()?;
        let outcome = ImportCoordinator::new(&db).run_from_path(&self.config.dataset_path)?;
        Ok(outcome.into())
    }

    /// Re-import dataset text regardless of the one-shot guard.
    pub fn reimport_dataset(&self, csv: String) -> Result<FfiImportSummary, NutriTrackError> {
        let db = self.db.lock()?;
        let report = ImportCoordinator::new(&db).run_forced(&csv)?;
        Ok(ImportOutcome::Completed(report).into())
    }

    pub fn is_dataset_imported(&self) -> Result<bool, NutriTrackError> {
        let db = self.db.lock()?;
        Ok(db.is_patients_imported()?)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Get a patient by dataset ID.
    pub fn get_patient(&self, patient_id: i64) -> Result<Option<FfiPatient>, NutriTrackError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(patient_id)?;
        Ok(patient.map(|p| self.to_ffi(p)))
    }

    /// All patients ordered by ID.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, NutriTrackError> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        Ok(patients.into_iter().map(|p| self.to_ffi(p)).collect())
    }

    /// IDs offered on the login screen.
    pub fn registered_patient_ids(&self) -> Result<Vec<i64>, NutriTrackError> {
        let db = self.db.lock()?;
        Ok(db.registered_patient_ids()?)
    }

    /// IDs offered on the registration screen.
    pub fn all_patient_ids(&self) -> Result<Vec<i64>, NutriTrackError> {
        let db = self.db.lock()?;
        Ok(db.all_patient_ids()?)
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Claim an imported patient with a display name and password.
    pub fn claim_patient(
        &self,
        patient_id: i64,
        phone_number: String,
        name: String,
        password: String,
        confirm_password: String,
    ) -> Result<FfiPatient, NutriTrackError> {
        let db = self.db.lock()?;
        let patient = Accounts::new(&db).claim_patient(&ClaimRequest {
            patient_id,
            phone_number: &phone_number,
            name: &name,
            password: &password,
            confirm_password: &confirm_password,
        })?;
        Ok(self.to_ffi(patient))
    }

    pub fn login(&self, patient_id: i64, password: String) -> Result<FfiSession, NutriTrackError> {
        let db = self.db.lock()?;
        let session = Accounts::new(&db).login(patient_id, &password)?;
        Ok(session.into())
    }

    /// The session persisted by the last login, if still valid.
    pub fn restore_session(&self) -> Result<Option<FfiSession>, NutriTrackError> {
        let db = self.db.lock()?;
        let session = Accounts::new(&db).restore_session()?;
        Ok(session.map(|s| s.into()))
    }

    pub fn logout(&self) -> Result<(), NutriTrackError> {
        let db = self.db.lock()?;
        Accounts::new(&db).logout()?;
        Ok(())
    }

    // =========================================================================
    // Questionnaire Operations
    // =========================================================================

    pub fn submit_food_intake(
        &self,
        session: FfiSession,
        intake: FfiFoodIntake,
    ) -> Result<FfiFoodIntake, NutriTrackError> {
        let db = self.db.lock()?;
        let session = active_session(&db, session)?;
        let profile = Questionnaire::new(&db).submit(&session, intake.into())?;
        Ok(profile.into())
    }

    pub fn get_food_intake(&self, session: FfiSession) -> Result<Option<FfiFoodIntake>, NutriTrackError> {
        let db = self.db.lock()?;
        let session = active_session(&db, session)?;
        let profile = Questionnaire::new(&db).load(&session)?;
        Ok(profile.map(|p| p.into()))
    }

    pub fn has_completed_questionnaire(&self, session: FfiSession) -> Result<bool, NutriTrackError> {
        let db = self.db.lock()?;
        let session = active_session(&db, session)?;
        Ok(Questionnaire::new(&db).has_completed(&session)?)
    }

    // =========================================================================
    // Score Operations
    // =========================================================================

    /// Set a patient's fruit score (clamped to 0-10).
    pub fn set_fruit_score(&self, patient_id: i64, value: f64) -> Result<FfiPatient, NutriTrackError> {
        let db = self.db.lock()?;
        let updater = FruitScoreUpdater::new(&db, self.config.scoring.fruit_edit);
        let patient = updater.set_fruit_score(patient_id, value)?;
        Ok(self.to_ffi(patient))
    }

    /// Rewrite every stored total to the sum of its sub-scores.
    pub fn reconcile_total_scores(&self) -> Result<u32, NutriTrackError> {
        let db = self.db.lock()?;
        let updated = db.reconcile_total_scores()?;
        tracing::info!(updated, "Reconciled total scores");
        Ok(updated as u32)
    }

    /// Average total score of male and female patients.
    pub fn average_total_by_sex(&self) -> Result<FfiSexAverages, NutriTrackError> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        let averages = scoring::average_by_sex(&patients, self.config.scoring.total_source);
        Ok(averages.into())
    }

    /// Plain-text score summary for the share sheet.
    pub fn share_insights(&self, patient_id: i64) -> Result<String, NutriTrackError> {
        let db = self.db.lock()?;
        let patient = db
            .get_patient(patient_id)?
            .ok_or_else(|| NutriTrackError::NotFound(format!("patient {}", patient_id)))?;
        Ok(scoring::insights_share_text(&patient, self.config.scoring.total_source))
    }

    // =========================================================================
    // Tip Operations
    // =========================================================================

    pub fn add_tip(&self, session: FfiSession, message: String) -> Result<FfiTip, NutriTrackError> {
        let db = self.db.lock()?;
        let session = active_session(&db, session)?;
        let tip_id = db.insert_tip(session.patient_id, &message)?;
        let tip = db
            .list_tips(session.patient_id)?
            .into_iter()
            .find(|t| t.tip_id == tip_id)
            .ok_or_else(|| NutriTrackError::NotFound(format!("tip {}", tip_id)))?;
        Ok(tip.into())
    }

    pub fn list_tips(&self, session: FfiSession) -> Result<Vec<FfiTip>, NutriTrackError> {
        let db = self.db.lock()?;
        let session = active_session(&db, session)?;
        let tips = db.list_tips(session.patient_id)?;
        Ok(tips.into_iter().map(|t| t.into()).collect())
    }
}

impl NutriTrackCore {
    fn to_ffi(&self, patient: PatientRecord) -> FfiPatient {
        FfiPatient::from_record(patient, self.config.scoring.total_source)
    }
}

/// Convert a caller-held session, rejecting it unless it is the active one.
fn active_session(db: &Database, session: FfiSession) -> Result<Session, NutriTrackError> {
    let session: Session = session.into();
    Accounts::new(db).require_session(&session)?;
    Ok(session)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: i64,
    pub sex: String,
    pub phone_number: String,
    pub name: Option<String>,
    pub registered: bool,
    /// Total according to the configured source
    pub total_score: f64,
    pub scores: Vec<FfiCategoryScore>,
}

impl FfiPatient {
    fn from_record(patient: PatientRecord, source: TotalScoreSource) -> Self {
        Self {
            total_score: scoring::total_score(&patient, source),
            scores: patient
                .scores
                .iter()
                .map(|(category, score)| FfiCategoryScore {
                    category: category.label().to_string(),
                    score,
                    max_score: category.max_score(),
                })
                .collect(),
            name: patient.registration.name().map(str::to_string),
            registered: patient.is_registered(),
            patient_id: patient.patient_id,
            sex: patient.sex.as_str().to_string(),
            phone_number: patient.phone_number,
        }
    }
}

/// FFI-safe sub-score with its maximum.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCategoryScore {
    pub category: String,
    pub score: f64,
    pub max_score: f64,
}

/// FFI-safe session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub session_id: String,
    pub patient_id: i64,
    pub started_at: String,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            patient_id: session.patient_id,
            started_at: session.started_at,
        }
    }
}

impl From<FfiSession> for Session {
    fn from(session: FfiSession) -> Self {
        Session {
            session_id: session.session_id,
            patient_id: session.patient_id,
            started_at: session.started_at,
        }
    }
}

/// FFI-safe food category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiFoodCategory {
    Fruits,
    Vegetables,
    Grains,
    RedMeat,
    Seafood,
    Poultry,
    Fish,
    Eggs,
    NutsOrSeeds,
}

impl From<FoodCategory> for FfiFoodCategory {
    fn from(category: FoodCategory) -> Self {
        match category {
            FoodCategory::Fruits => FfiFoodCategory::Fruits,
            FoodCategory::Vegetables => FfiFoodCategory::Vegetables,
            FoodCategory::Grains => FfiFoodCategory::Grains,
            FoodCategory::RedMeat => FfiFoodCategory::RedMeat,
            FoodCategory::Seafood => FfiFoodCategory::Seafood,
            FoodCategory::Poultry => FfiFoodCategory::Poultry,
            FoodCategory::Fish => FfiFoodCategory::Fish,
            FoodCategory::Eggs => FfiFoodCategory::Eggs,
            FoodCategory::NutsOrSeeds => FfiFoodCategory::NutsOrSeeds,
        }
    }
}

impl From<FfiFoodCategory> for FoodCategory {
    fn from(category: FfiFoodCategory) -> Self {
        match category {
            FfiFoodCategory::Fruits => FoodCategory::Fruits,
            FfiFoodCategory::Vegetables => FoodCategory::Vegetables,
            FfiFoodCategory::Grains => FoodCategory::Grains,
            FfiFoodCategory::RedMeat => FoodCategory::RedMeat,
            FfiFoodCategory::Seafood => FoodCategory::Seafood,
            FfiFoodCategory::Poultry => FoodCategory::Poultry,
            FfiFoodCategory::Fish => FoodCategory::Fish,
            FfiFoodCategory::Eggs => FoodCategory::Eggs,
            FfiFoodCategory::NutsOrSeeds => FoodCategory::NutsOrSeeds,
        }
    }
}

/// FFI-safe questionnaire answers.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFoodIntake {
    pub wake_time: String,
    pub biggest_meal_time: String,
    pub sleep_time: String,
    pub persona: String,
    pub foods: Vec<FfiFoodCategory>,
}

impl From<FfiFoodIntake> for QuestionnaireAnswers {
    fn from(intake: FfiFoodIntake) -> Self {
        let categories: Vec<FoodCategory> = intake.foods.into_iter().map(|c| c.into()).collect();
        QuestionnaireAnswers {
            wake_time: intake.wake_time,
            biggest_meal_time: intake.biggest_meal_time,
            sleep_time: intake.sleep_time,
            persona: intake.persona,
            foods: FoodSelection::from_categories(&categories),
        }
    }
}

impl From<FoodIntakeProfile> for FfiFoodIntake {
    fn from(profile: FoodIntakeProfile) -> Self {
        Self {
            foods: profile.foods.selected().into_iter().map(|c| c.into()).collect(),
            wake_time: profile.wake_time,
            biggest_meal_time: profile.biggest_meal_time,
            sleep_time: profile.sleep_time,
            persona: profile.persona,
        }
    }
}

/// FFI-safe coaching tip.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTip {
    pub tip_id: i64,
    pub patient_id: i64,
    pub message: String,
    pub created_at: String,
}

impl From<Tip> for FfiTip {
    fn from(tip: Tip) -> Self {
        Self {
            tip_id: tip.tip_id,
            patient_id: tip.patient_id,
            message: tip.message,
            created_at: tip.created_at,
        }
    }
}

/// FFI-safe import result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportSummary {
    /// True when the one-shot guard short-circuited the run
    pub skipped: bool,
    pub dataset_changed: Option<bool>,
    pub rows_processed: u32,
    pub imported: u32,
    pub failures: Vec<String>,
}

impl From<ImportOutcome> for FfiImportSummary {
    fn from(outcome: ImportOutcome) -> Self {
        match outcome {
            ImportOutcome::Completed(report) => Self {
                skipped: false,
                dataset_changed: None,
                rows_processed: report.rows_processed as u32,
                imported: report.imported as u32,
                failures: report
                    .failures
                    .into_iter()
                    .map(|f| f.to_string())
                    .collect(),
            },
            ImportOutcome::Skipped { dataset_changed } => Self {
                skipped: true,
                dataset_changed,
                rows_processed: 0,
                imported: 0,
                failures: Vec::new(),
            },
        }
    }
}

/// FFI-safe averages by sex.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSexAverages {
    pub male: f64,
    pub female: f64,
}

impl From<SexAverages> for FfiSexAverages {
    fn from(averages: SexAverages) -> Self {
        Self {
            male: averages.male,
            female: averages.female,
        }
    }
}
