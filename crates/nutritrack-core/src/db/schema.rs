//! SQLite schema definition.

/// Complete database schema for NutriTrack.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients (cohort loaded from the HEIFA dataset)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id INTEGER PRIMARY KEY,
    sex TEXT NOT NULL CHECK (sex IN ('Male', 'Female')),
    phone_number TEXT NOT NULL,
    name TEXT,                                   -- NULL until claimed
    password_digest TEXT,                        -- NULL until claimed
    total_score REAL NOT NULL DEFAULT 0,
    discretionary_foods REAL NOT NULL DEFAULT 0,
    vegetables REAL NOT NULL DEFAULT 0,
    fruit REAL NOT NULL DEFAULT 0,
    grains_and_cereals REAL NOT NULL DEFAULT 0,
    whole_grains REAL NOT NULL DEFAULT 0,
    meat_and_alternatives REAL NOT NULL DEFAULT 0,
    dairy_and_alternatives REAL NOT NULL DEFAULT 0,
    water REAL NOT NULL DEFAULT 0,
    saturated_fat REAL NOT NULL DEFAULT 0,
    unsaturated_fat REAL NOT NULL DEFAULT 0,
    sodium REAL NOT NULL DEFAULT 0,
    sugar REAL NOT NULL DEFAULT 0,
    alcohol REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((name IS NULL) = (password_digest IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_patients_sex ON patients(sex);
CREATE INDEX IF NOT EXISTS idx_patients_phone ON patients(phone_number);

-- ============================================================================
-- Food Intake Questionnaire (one row per patient, replaced on submit)
-- ============================================================================

CREATE TABLE IF NOT EXISTS food_intake (
    patient_id INTEGER PRIMARY KEY REFERENCES patients(patient_id) ON DELETE CASCADE,
    sleep_time TEXT NOT NULL,
    wake_time TEXT NOT NULL,
    biggest_meal_time TEXT NOT NULL,
    persona TEXT NOT NULL DEFAULT '',
    intake_fruits INTEGER NOT NULL DEFAULT 0,
    intake_vegetables INTEGER NOT NULL DEFAULT 0,
    intake_grains INTEGER NOT NULL DEFAULT 0,
    intake_red_meat INTEGER NOT NULL DEFAULT 0,
    intake_seafood INTEGER NOT NULL DEFAULT 0,
    intake_poultry INTEGER NOT NULL DEFAULT 0,
    intake_fish INTEGER NOT NULL DEFAULT 0,
    intake_eggs INTEGER NOT NULL DEFAULT 0,
    intake_nuts_or_seeds INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- NutriCoach Tips (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS tips (
    tip_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_tips_patient ON tips(patient_id);

-- ============================================================================
-- App State
-- ============================================================================

CREATE TABLE IF NOT EXISTS app_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One-shot import guard
INSERT OR IGNORE INTO app_state (key, value) VALUES ('patients_imported', 'false');
INSERT OR IGNORE INTO app_state (key, value) VALUES ('patients_import_digest', '');
"#;
