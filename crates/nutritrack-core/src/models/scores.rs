//! HEIFA score categories and per-patient sub-scores.

use serde::{Deserialize, Serialize};

use super::Sex;

/// Highest possible HEIFA total.
pub const MAX_TOTAL_SCORE: f64 = 100.0;

/// Dataset column prefix for the precomputed total score.
pub const TOTAL_SCORE_PREFIX: &str = "HEIFAtotalscore";

/// One of the thirteen HEIFA sub-score categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreCategory {
    DiscretionaryFoods,
    Vegetables,
    Fruit,
    GrainsAndCereals,
    WholeGrains,
    MeatAndAlternatives,
    DairyAndAlternatives,
    Water,
    SaturatedFat,
    UnsaturatedFat,
    Sodium,
    Sugar,
    Alcohol,
}

impl ScoreCategory {
    /// All categories in dataset order.
    pub const ALL: [ScoreCategory; 13] = [
        ScoreCategory::DiscretionaryFoods,
        ScoreCategory::Vegetables,
        ScoreCategory::Fruit,
        ScoreCategory::GrainsAndCereals,
        ScoreCategory::WholeGrains,
        ScoreCategory::MeatAndAlternatives,
        ScoreCategory::DairyAndAlternatives,
        ScoreCategory::Water,
        ScoreCategory::SaturatedFat,
        ScoreCategory::UnsaturatedFat,
        ScoreCategory::Sodium,
        ScoreCategory::Sugar,
        ScoreCategory::Alcohol,
    ];

    /// Upper bound of the category score.
    pub fn max_score(&self) -> f64 {
        match self {
            ScoreCategory::GrainsAndCereals
            | ScoreCategory::WholeGrains
            | ScoreCategory::Water
            | ScoreCategory::SaturatedFat
            | ScoreCategory::UnsaturatedFat
            | ScoreCategory::Alcohol => 5.0,
            _ => 10.0,
        }
    }

    /// Dataset column prefix; the concrete column appends `Male` or `Female`.
    pub fn column_prefix(&self) -> &'static str {
        match self {
            ScoreCategory::DiscretionaryFoods => "DiscretionaryHEIFAscore",
            ScoreCategory::Vegetables => "VegetablesHEIFAscore",
            ScoreCategory::Fruit => "FruitHEIFAscore",
            ScoreCategory::GrainsAndCereals => "GrainsandcerealsHEIFAscore",
            ScoreCategory::WholeGrains => "WholegrainsHEIFAscore",
            ScoreCategory::MeatAndAlternatives => "MeatandalternativesHEIFAscore",
            ScoreCategory::DairyAndAlternatives => "DairyandalternativesHEIFAscore",
            ScoreCategory::Water => "WaterHEIFA",
            ScoreCategory::SaturatedFat => "SaturatedFatHEIFAscore",
            ScoreCategory::UnsaturatedFat => "UnsaturatedFatHEIFAscore",
            ScoreCategory::Sodium => "SodiumHEIFAscore",
            ScoreCategory::Sugar => "SugarHEIFAscore",
            ScoreCategory::Alcohol => "AlcoholHEIFAscore",
        }
    }

    /// Concrete dataset column for a patient of the given sex.
    pub fn column_name(&self, sex: Sex) -> String {
        format!("{}{}", self.column_prefix(), sex.as_str())
    }

    /// SQLite column holding this score.
    pub(crate) fn db_column(&self) -> &'static str {
        match self {
            ScoreCategory::DiscretionaryFoods => "discretionary_foods",
            ScoreCategory::Vegetables => "vegetables",
            ScoreCategory::Fruit => "fruit",
            ScoreCategory::GrainsAndCereals => "grains_and_cereals",
            ScoreCategory::WholeGrains => "whole_grains",
            ScoreCategory::MeatAndAlternatives => "meat_and_alternatives",
            ScoreCategory::DairyAndAlternatives => "dairy_and_alternatives",
            ScoreCategory::Water => "water",
            ScoreCategory::SaturatedFat => "saturated_fat",
            ScoreCategory::UnsaturatedFat => "unsaturated_fat",
            ScoreCategory::Sodium => "sodium",
            ScoreCategory::Sugar => "sugar",
            ScoreCategory::Alcohol => "alcohol",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::DiscretionaryFoods => "Discretionary Foods",
            ScoreCategory::Vegetables => "Vegetables",
            ScoreCategory::Fruit => "Fruits",
            ScoreCategory::GrainsAndCereals => "Grains & Cereals",
            ScoreCategory::WholeGrains => "Whole Grains",
            ScoreCategory::MeatAndAlternatives => "Meat & Alternatives",
            ScoreCategory::DairyAndAlternatives => "Dairy & Alternatives",
            ScoreCategory::Water => "Water",
            ScoreCategory::SaturatedFat => "Saturated Fat",
            ScoreCategory::UnsaturatedFat => "Unsaturated Fats",
            ScoreCategory::Sodium => "Sodium",
            ScoreCategory::Sugar => "Sugars",
            ScoreCategory::Alcohol => "Alcohol",
        }
    }

    /// Whether `value` is a finite score within `[0, max_score]`.
    pub fn accepts(&self, value: f64) -> bool {
        value.is_finite() && (0.0..=self.max_score()).contains(&value)
    }
}

/// The thirteen HEIFA sub-scores of one patient.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SubScores {
    pub discretionary_foods: f64,
    pub vegetables: f64,
    pub fruit: f64,
    pub grains_and_cereals: f64,
    pub whole_grains: f64,
    pub meat_and_alternatives: f64,
    pub dairy_and_alternatives: f64,
    pub water: f64,
    pub saturated_fat: f64,
    pub unsaturated_fat: f64,
    pub sodium: f64,
    pub sugar: f64,
    pub alcohol: f64,
}

impl SubScores {
    /// Read one category.
    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::DiscretionaryFoods => self.discretionary_foods,
            ScoreCategory::Vegetables => self.vegetables,
            ScoreCategory::Fruit => self.fruit,
            ScoreCategory::GrainsAndCereals => self.grains_and_cereals,
            ScoreCategory::WholeGrains => self.whole_grains,
            ScoreCategory::MeatAndAlternatives => self.meat_and_alternatives,
            ScoreCategory::DairyAndAlternatives => self.dairy_and_alternatives,
            ScoreCategory::Water => self.water,
            ScoreCategory::SaturatedFat => self.saturated_fat,
            ScoreCategory::UnsaturatedFat => self.unsaturated_fat,
            ScoreCategory::Sodium => self.sodium,
            ScoreCategory::Sugar => self.sugar,
            ScoreCategory::Alcohol => self.alcohol,
        }
    }

    /// Overwrite one category.
    pub fn set(&mut self, category: ScoreCategory, value: f64) {
        let slot = match category {
            ScoreCategory::DiscretionaryFoods => &mut self.discretionary_foods,
            ScoreCategory::Vegetables => &mut self.vegetables,
            ScoreCategory::Fruit => &mut self.fruit,
            ScoreCategory::GrainsAndCereals => &mut self.grains_and_cereals,
            ScoreCategory::WholeGrains => &mut self.whole_grains,
            ScoreCategory::MeatAndAlternatives => &mut self.meat_and_alternatives,
            ScoreCategory::DairyAndAlternatives => &mut self.dairy_and_alternatives,
            ScoreCategory::Water => &mut self.water,
            ScoreCategory::SaturatedFat => &mut self.saturated_fat,
            ScoreCategory::UnsaturatedFat => &mut self.unsaturated_fat,
            ScoreCategory::Sodium => &mut self.sodium,
            ScoreCategory::Sugar => &mut self.sugar,
            ScoreCategory::Alcohol => &mut self.alcohol,
        };
        *slot = value;
    }

    /// Sum of all thirteen sub-scores.
    pub fn sum(&self) -> f64 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Iterate `(category, score)` pairs in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (ScoreCategory, f64)> + '_ {
        ScoreCategory::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}
