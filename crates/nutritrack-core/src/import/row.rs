//! Dataset row parsing.

use thiserror::Error;

use super::header::{HeaderMap, ScoreColumn, COLUMN_PATIENT_ID, COLUMN_PHONE_NUMBER, COLUMN_SEX};
use crate::models::{PatientRecord, ScoreCategory, Sex};

/// Why a dataset row could not be turned into a patient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    /// Gendered column absent from the header
    #[error("missing column {0}")]
    MissingColumn(String),

    #[error("cannot parse {value:?} in column {column}")]
    Unparsable { column: String, value: String },

    /// Score outside its category's bounds
    #[error("{value} in column {column} is outside 0..={max}")]
    OutOfRange { column: String, value: f64, max: f64 },
}

/// Parse one data line into a patient record.
///
/// Score columns are looked up for the row's own sex. New records are unclaimed.
pub fn parse_row(header: &HeaderMap, line: &str) -> Result<PatientRecord, RowError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < header.width() {
        return Err(RowError::TooFewFields {
            expected: header.width(),
            found: fields.len(),
        });
    }

    let raw_id = fields[header.patient_id()];
    let patient_id = raw_id.parse::<i64>().map_err(|_| RowError::Unparsable {
        column: COLUMN_PATIENT_ID.into(),
        value: raw_id.into(),
    })?;

    let raw_sex = fields[header.sex()];
    let sex = Sex::parse(raw_sex).ok_or_else(|| RowError::Unparsable {
        column: COLUMN_SEX.into(),
        value: raw_sex.into(),
    })?;

    let phone_number = fields[header.phone_number()];
    if phone_number.is_empty() {
        return Err(RowError::Unparsable {
            column: COLUMN_PHONE_NUMBER.into(),
            value: String::new(),
        });
    }

    let score = |column: ScoreColumn| -> Result<f64, RowError> {
        let name = column.name_for(sex);
        let index = header
            .score(column, sex)
            .ok_or_else(|| RowError::MissingColumn(name.clone()))?;
        let raw = fields[index];
        let value = raw.parse::<f64>().map_err(|_| RowError::Unparsable {
            column: name.clone(),
            value: raw.into(),
        })?;
        if !column.accepts(value) {
            return Err(RowError::OutOfRange {
                column: name,
                value,
                max: column.max_score(),
            });
        }
        Ok(value)
    };

    let mut patient = PatientRecord::new(patient_id, sex, phone_number.to_string());
    patient.total_score = score(ScoreColumn::Total)?;
    for category in ScoreCategory::ALL {
        patient
            .scores
            .set(category, score(ScoreColumn::Category(category))?);
    }

    Ok(patient)
}
