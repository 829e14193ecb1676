//! Patient registration, login and the persisted session.
//!
//! Registration claims a patient imported from the dataset; it never creates
//! one. A successful login yields a [`Session`] that callers pass to every
//! operation acting on behalf of the current patient.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{password_digest_for, PatientRecord, Session};
use crate::validation::{validate_name, validate_password, ValidationError};

/// Registration and login failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User ID not found")]
    UnknownPatient(i64),

    #[error("Account has not been registered")]
    NotRegistered(i64),

    #[error("Account is already registered")]
    AlreadyRegistered(i64),

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Session is no longer active")]
    SessionExpired,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// A claim request as entered on the registration form.
#[derive(Debug, Clone)]
pub struct ClaimRequest<'r> {
    pub patient_id: i64,
    pub phone_number: &'r str,
    pub name: &'r str,
    pub password: &'r str,
    pub confirm_password: &'r str,
}

/// Registration and login against the patient store.
pub struct Accounts<'a> {
    db: &'a Database,
}

impl<'a> Accounts<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Claim an imported patient.
    ///
    /// Checks run in order: the patient exists and is unclaimed, the phone
    /// number matches the dataset, then the name and password rules. Nothing
    /// is written unless every check passes.
    pub fn claim_patient(&self, request: &ClaimRequest<'_>) -> AuthResult<PatientRecord> {
        let patient = self
            .db
            .get_patient(request.patient_id)?
            .ok_or(AuthError::UnknownPatient(request.patient_id))?;
        if patient.is_registered() {
            return Err(AuthError::AlreadyRegistered(request.patient_id));
        }
        if patient.phone_number != request.phone_number.trim() {
            return Err(ValidationError::IdentityMismatch.into());
        }
        validate_name(request.name)?;
        validate_password(request.password, request.confirm_password)?;

        let digest = password_digest_for(request.patient_id, request.password);
        self.db
            .claim_patient(request.patient_id, request.name, &digest)
            .map_err(|e| match e {
                DbError::Constraint(_) => AuthError::AlreadyRegistered(request.patient_id),
                other => other.into(),
            })?;

        tracing::info!(patient_id = request.patient_id, "Patient registered");

        self.db
            .get_patient(request.patient_id)?
            .ok_or(AuthError::UnknownPatient(request.patient_id))
    }

    /// Log in a registered patient and persist the new session.
    pub fn login(&self, patient_id: i64, password: &str) -> AuthResult<Session> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or(AuthError::UnknownPatient(patient_id))?;
        if !patient.is_registered() {
            return Err(AuthError::NotRegistered(patient_id));
        }
        if !patient.verify_password(password) {
            tracing::debug!(patient_id, "Login rejected");
            return Err(AuthError::IncorrectPassword);
        }

        let session = Session::new(patient_id);
        self.db.save_session(&session)?;
        tracing::info!(patient_id, session_id = %session.session_id, "Patient logged in");
        Ok(session)
    }

    /// The persisted session, if its patient is still registered.
    pub fn restore_session(&self) -> AuthResult<Option<Session>> {
        let Some(session) = self.db.load_session()? else {
            return Ok(None);
        };
        match self.db.get_patient(session.patient_id)? {
            Some(patient) if patient.is_registered() => Ok(Some(session)),
            _ => {
                tracing::warn!(patient_id = session.patient_id, "Discarding stale session");
                self.db.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Check that `session` is the one persisted by the last login.
    ///
    /// Sessions from before a logout or a later login are rejected.
    pub fn require_session(&self, session: &Session) -> AuthResult<()> {
        match self.db.load_session()? {
            Some(active)
                if active.session_id == session.session_id
                    && active.patient_id == session.patient_id =>
            {
                Ok(())
            }
            _ => {
                tracing::debug!(patient_id = session.patient_id, "Rejected inactive session");
                Err(AuthError::SessionExpired)
            }
        }
    }

    pub fn logout(&self) -> AuthResult<()> {
        self.db.clear_session()?;
        tracing::debug!("Session cleared");
        Ok(())
    }
}
