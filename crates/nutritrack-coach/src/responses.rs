//! Parsing model responses into tips and clinician insights.

use serde::Deserialize;
use thiserror::Error;

use nutritrack_core::PatientRecord;

/// Insights kept from a pattern-analysis response.
pub const MAX_INSIGHTS: usize = 3;

/// Response parsing errors.
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Empty response")]
    Empty,
}

pub type CoachResult<T> = Result<T, CoachError>;

/// Structured tip some models return instead of plain text.
#[derive(Debug, Deserialize)]
struct TipPayload {
    #[serde(alias = "message", alias = "text")]
    tip: String,
}

/// Extract a single coaching tip from a response.
///
/// A JSON object with a `tip` (or `message`/`text`) field is unwrapped;
/// anything else is taken as plain text.
pub fn parse_tip(response: &str) -> CoachResult<String> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(CoachError::Empty);
    }

    let tip = if trimmed.starts_with('{') {
        let json_end = trimmed.rfind('}').ok_or_else(|| {
            CoachError::InvalidFormat("No closing brace found in response".into())
        })?;
        let payload: TipPayload = serde_json::from_str(&trimmed[..=json_end])?;
        tracing::debug!("Unwrapped JSON tip payload");
        payload.tip.trim().to_string()
    } else {
        trimmed.to_string()
    };

    if tip.is_empty() {
        return Err(CoachError::Empty);
    }
    Ok(tip)
}

/// Split a pattern-analysis response into at most three insight lines.
///
/// Blank lines are dropped; order is preserved.
pub fn parse_insights(response: &str) -> Vec<String> {
    let insights: Vec<String> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_INSIGHTS)
        .map(str::to_string)
        .collect();
    if insights.len() < MAX_INSIGHTS {
        tracing::warn!(found = insights.len(), "Response has fewer insights than requested");
    }
    insights
}

/// Canned tips for running without a model.
pub struct MockCoach;

impl MockCoach {
    pub fn tip(patient: &PatientRecord) -> String {
        let fruit = patient.scores.fruit;
        if fruit >= 8.0 {
            format!("Great work! A fruit score of {}/10 shows you are eating plenty of fruit. Keep it up.", fruit)
        } else if fruit >= 4.0 {
            format!("You scored {}/10 for fruit. Try adding a banana or berries to breakfast.", fruit)
        } else {
            format!("Your fruit score is {}/10. Start small with one piece of fruit a day.", fruit)
        }
    }
}
