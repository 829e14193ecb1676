//! Header parsing and gendered column lookup.

use std::collections::HashMap;

use crate::models::{ScoreCategory, Sex, TOTAL_SCORE_PREFIX};

pub const COLUMN_PATIENT_ID: &str = "User_ID";
pub const COLUMN_SEX: &str = "Sex";
pub const COLUMN_PHONE_NUMBER: &str = "PhoneNumber";

/// A score column whose concrete name depends on the patient's sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreColumn {
    Total,
    Category(ScoreCategory),
}

impl ScoreColumn {
    /// Every gendered column the parser reads.
    pub fn all() -> impl Iterator<Item = ScoreColumn> {
        std::iter::once(ScoreColumn::Total)
            .chain(ScoreCategory::ALL.iter().map(|c| ScoreColumn::Category(*c)))
    }

    pub fn name_for(&self, sex: Sex) -> String {
        match self {
            ScoreColumn::Total => format!("{}{}", TOTAL_SCORE_PREFIX, sex.as_str()),
            ScoreColumn::Category(c) => c.column_name(sex),
        }
    }

    pub fn max_score(&self) -> f64 {
        match self {
            ScoreColumn::Total => crate::models::MAX_TOTAL_SCORE,
            ScoreColumn::Category(c) => c.max_score(),
        }
    }

    /// Whether `value` is a finite score within `[0, max_score]`.
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            ScoreColumn::Total => value.is_finite() && (0.0..=self.max_score()).contains(&value),
            ScoreColumn::Category(c) => c.accepts(value),
        }
    }
}

/// Column positions resolved once from the dataset's header line.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    width: usize,
    patient_id: usize,
    sex: usize,
    phone_number: usize,
    gendered: HashMap<(ScoreColumn, Sex), usize>,
}

impl HeaderMap {
    /// Build from the header line.
    ///
    /// Fails with the list of absent base columns; absent gendered columns are
    /// tolerated here and reported per row. A leading byte-order mark is ignored.
    pub fn parse(line: &str) -> Result<Self, Vec<String>> {
        let line = line.strip_prefix('\u{FEFF}').unwrap_or(line);
        let names: Vec<&str> = line.split(',').map(str::trim).collect();
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i))
            .collect();

        let mut missing = Vec::new();
        let mut base = |name: &str| {
            let found = index.get(name).copied();
            if found.is_none() {
                missing.push(name.to_string());
            }
            found.unwrap_or_default()
        };
        let patient_id = base(COLUMN_PATIENT_ID);
        let sex = base(COLUMN_SEX);
        let phone_number = base(COLUMN_PHONE_NUMBER);
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut gendered = HashMap::new();
        for column in ScoreColumn::all() {
            for sex in [Sex::Male, Sex::Female] {
                if let Some(i) = index.get(column.name_for(sex).as_str()) {
                    gendered.insert((column, sex), *i);
                }
            }
        }

        Ok(Self {
            width: names.len(),
            patient_id,
            sex,
            phone_number,
            gendered,
        })
    }

    /// Number of header fields.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn patient_id(&self) -> usize {
        self.patient_id
    }

    pub fn sex(&self) -> usize {
        self.sex
    }

    pub fn phone_number(&self) -> usize {
        self.phone_number
    }

    /// Position of a gendered column for the given sex.
    pub fn score(&self, column: ScoreColumn, sex: Sex) -> Option<usize> {
        self.gendered.get(&(column, sex)).copied()
    }

    /// Names of gendered columns absent from the header.
    pub fn missing_gendered_columns(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for column in ScoreColumn::all() {
            for sex in [Sex::Male, Sex::Female] {
                if !self.gendered.contains_key(&(column, sex)) {
                    missing.push(column.name_for(sex));
                }
            }
        }
        missing
    }
}
