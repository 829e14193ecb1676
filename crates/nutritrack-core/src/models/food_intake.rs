//! Food intake questionnaire models.

use serde::{Deserialize, Serialize};

/// Food categories offered by the questionnaire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FoodCategory {
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

impl FoodCategory {
    pub const ALL: [FoodCategory; 9] = [
        FoodCategory::Fruits,
        FoodCategory::Vegetables,
        FoodCategory::Grains,
        FoodCategory::RedMeat,
        FoodCategory::Seafood,
        FoodCategory::Poultry,
        FoodCategory::Fish,
        FoodCategory::Eggs,
        FoodCategory::NutsOrSeeds,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FoodCategory::Fruits => "Fruits",
            FoodCategory::Vegetables => "Vegetables",
            FoodCategory::Grains => "Grains",
            FoodCategory::RedMeat => "Red Meat",
            FoodCategory::Seafood => "Seafood",
            FoodCategory::Poultry => "Poultry",
            FoodCategory::Fish => "Fish",
            FoodCategory::Eggs => "Eggs",
            FoodCategory::NutsOrSeeds => "Nuts/Seeds",
        }
    }
}

/// Which food categories a patient reported eating.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FoodSelection {
    pub fruits: bool,
    pub vegetables: bool,
    pub grains: bool,
    pub red_meat: bool,
    pub seafood: bool,
    pub poultry: bool,
    pub fish: bool,
    pub eggs: bool,
    pub nuts_or_seeds: bool,
}

impl FoodSelection {
    /// Build a selection from a list of chosen categories.
    pub fn from_categories(categories: &[FoodCategory]) -> Self {
        let mut selection = Self::default();
        for category in categories {
            selection.set(*category, true);
        }
        selection
    }

    pub fn is_selected(&self, category: FoodCategory) -> bool {
        match category {
            FoodCategory::Fruits => self.fruits,
            FoodCategory::Vegetables => self.vegetables,
            FoodCategory::Grains => self.grains,
            FoodCategory::RedMeat => self.red_meat,
            FoodCategory::Seafood => self.seafood,
            FoodCategory::Poultry => self.poultry,
            FoodCategory::Fish => self.fish,
            FoodCategory::Eggs => self.eggs,
            FoodCategory::NutsOrSeeds => self.nuts_or_seeds,
        }
    }

    pub fn set(&mut self, category: FoodCategory, selected: bool) {
        let slot = match category {
            FoodCategory::Fruits => &mut self.fruits,
            FoodCategory::Vegetables => &mut self.vegetables,
            FoodCategory::Grains => &mut self.grains,
            FoodCategory::RedMeat => &mut self.red_meat,
            FoodCategory::Seafood => &mut self.seafood,
            FoodCategory::Poultry => &mut self.poultry,
            FoodCategory::Fish => &mut self.fish,
            FoodCategory::Eggs => &mut self.eggs,
            FoodCategory::NutsOrSeeds => &mut self.nuts_or_seeds,
        };
        *slot = selected;
    }

    /// Selected categories in questionnaire order.
    pub fn selected(&self) -> Vec<FoodCategory> {
        FoodCategory::ALL
            .iter()
            .copied()
            .filter(|c| self.is_selected(*c))
            .collect()
    }

    pub fn any_selected(&self) -> bool {
        FoodCategory::ALL.iter().any(|c| self.is_selected(*c))
    }
}

/// A patient's questionnaire answers. Replaced wholesale on each submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodIntakeProfile {
    /// Owning patient
    pub patient_id: i64,
    /// Sleep time, `HH:MM`
    pub sleep_time: String,
    /// Wake time, `HH:MM`
    pub wake_time: String,
    /// Biggest meal time, `HH:MM`
    pub biggest_meal_time: String,
    /// Persona label (e.g. "Health Devotee")
    pub persona: String,
    /// Reported food categories
    pub foods: FoodSelection,
}

impl FoodIntakeProfile {
    /// Whether the questionnaire counts as completed.
    pub fn is_complete(&self) -> bool {
        self.foods.any_selected()
    }
}
