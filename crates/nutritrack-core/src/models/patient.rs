//! Patient models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::SubScores;

/// Patient sex as recorded in the dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Canonical form, also the gendered column suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }

    /// Parse case-insensitively, ignoring surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("male") {
            Some(Sex::Male)
        } else if s.eq_ignore_ascii_case("female") {
            Some(Sex::Female)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an imported patient has been claimed by a registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RegistrationState {
    /// Imported but never registered
    Unclaimed,
    /// Registered with a display name and password digest
    Claimed { name: String, password_digest: String },
}

impl RegistrationState {
    pub fn is_claimed(&self) -> bool {
        matches!(self, RegistrationState::Claimed { .. })
    }

    /// Display name, if claimed.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegistrationState::Claimed { name, .. } => Some(name),
            RegistrationState::Unclaimed => None,
        }
    }
}

/// A cohort patient with HEIFA scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Dataset-supplied identifier
    pub patient_id: i64,
    /// Sex, selects the gendered dataset columns
    pub sex: Sex,
    /// Phone number used to verify a claim
    pub phone_number: String,
    /// Registration status
    pub registration: RegistrationState,
    /// The thirteen sub-scores
    pub scores: SubScores,
    /// Precomputed total from the dataset (0-100)
    pub total_score: f64,
}

impl PatientRecord {
    /// Create an unclaimed patient with zeroed scores.
    pub fn new(patient_id: i64, sex: Sex, phone_number: String) -> Self {
        Self {
            patient_id,
            sex,
            phone_number,
            registration: RegistrationState::Unclaimed,
            scores: SubScores::default(),
            total_score: 0.0,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_claimed()
    }

    /// Total recomputed from the sub-scores.
    pub fn derived_total(&self) -> f64 {
        self.scores.sum()
    }

    /// Check a plaintext password against the stored digest.
    pub fn verify_password(&self, password: &str) -> bool {
        match &self.registration {
            RegistrationState::Claimed { password_digest, .. } => {
                *password_digest == password_digest_for(self.patient_id, password)
            }
            RegistrationState::Unclaimed => false,
        }
    }
}

/// Salted SHA-256 digest of a patient password, hex encoded.
pub fn password_digest_for(patient_id: i64, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(patient_id.to_le_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
