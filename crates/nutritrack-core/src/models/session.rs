//! Login sessions and coaching tips.

use serde::{Deserialize, Serialize};

/// The logged-in patient. Created by login and passed to every operation
/// acting on behalf of the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Random session identifier
    pub session_id: String,
    /// Logged-in patient
    pub patient_id: i64,
    /// Login timestamp
    pub started_at: String,
}

impl Session {
    pub fn new(patient_id: i64) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A stored coaching message. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tip {
    pub tip_id: i64,
    pub patient_id: i64,
    pub message: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new(42);
        assert_eq!(session.patient_id, 42);
        assert_eq!(session.session_id.len(), 36); // UUID format
        assert_ne!(Session::new(42).session_id, session.session_id);
    }
}
