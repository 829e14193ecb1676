//! NutriCoach and clinician prompt templates.
//!
//! Templates are selected by a caller-supplied index (wrapped modulo the
//! template count) so callers choose the randomness source.

use nutritrack_core::{PatientRecord, ScoreCategory, Sex};

/// Rows included in a cohort summary.
pub const COHORT_SAMPLE_SIZE: usize = 9;

/// Rows per sex in the grouped cohort summary.
pub const GROUP_SAMPLE_SIZE: usize = 5;

type CoachTemplate = fn(&PatientRecord) -> String;
type PatternTemplate = fn(&[PatientRecord]) -> String;

const COACH_TEMPLATES: [CoachTemplate; 5] = [
    coach_score_overview,
    coach_motivational,
    coach_small_change,
    coach_colorful_fruits,
    coach_acknowledge_effort,
];

const PATTERN_TEMPLATES: [PatternTemplate; 7] = [
    pattern_fats_water_discretionary,
    pattern_sugar_alcohol_sodium,
    pattern_nutrient_imbalance,
    pattern_hydration_fruit,
    pattern_protein_sources,
    pattern_low_scorers,
    pattern_by_sex,
];

pub fn coach_prompt_count() -> usize {
    COACH_TEMPLATES.len()
}

pub fn pattern_prompt_count() -> usize {
    PATTERN_TEMPLATES.len()
}

/// Fruit-focused coaching prompt for one patient.
pub fn coach_prompt(patient: &PatientRecord, index: usize) -> String {
    COACH_TEMPLATES[index % COACH_TEMPLATES.len()](patient)
}

/// Cohort pattern-analysis prompt for a clinician.
pub fn pattern_prompt(patients: &[PatientRecord], index: usize) -> String {
    PATTERN_TEMPLATES[index % PATTERN_TEMPLATES.len()](patients)
}

/// `Label=score/max` for one category.
fn score(patient: &PatientRecord, label: &str, category: ScoreCategory) -> String {
    format!(
        "{}={}/{}",
        label,
        patient.scores.get(category),
        category.max_score()
    )
}

fn summarize<F>(patients: &[PatientRecord], line: F) -> String
where
    F: Fn(&PatientRecord) -> String,
{
    patients
        .iter()
        .take(COHORT_SAMPLE_SIZE)
        .map(line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn coach_score_overview(patient: &PatientRecord) -> String {
    let mut prompt = String::from(
        "Generate a short, friendly and encouraging message to help someone improve their fruit intake.\n\n\
         Patient nutrition scores:\n",
    );
    for category in COACH_OVERVIEW_ORDER {
        prompt.push_str(&format!(
            "- {}: {}/{}\n",
            category.label(),
            patient.scores.get(category),
            category.max_score()
        ));
    }
    prompt.push_str("\nPlease limit the message to 30 words or fewer.");
    prompt
}

const COACH_OVERVIEW_ORDER: [ScoreCategory; 13] = [
    ScoreCategory::Fruit,
    ScoreCategory::Vegetables,
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
    ScoreCategory::DiscretionaryFoods,
];

fn coach_motivational(patient: &PatientRecord) -> String {
    format!(
        "You are a supportive health coach. A user scored {}/10 for fruit intake. \
         Suggest a 30-word motivational message and include an emoji like 🍓 or 😊 to make it more engaging.",
        patient.scores.fruit
    )
}

fn coach_small_change(patient: &PatientRecord) -> String {
    format!(
        "A user scored {}/10 in fruit intake. Recommend a small change, like adding a banana to breakfast. \
         Make it friendly and realistic in under 30 words and include an emoji to make it more engaging.",
        patient.scores.fruit
    )
}

fn coach_colorful_fruits(patient: &PatientRecord) -> String {
    format!(
        "User's fruit score is {}/10. Encourage them to eat colorful fruits like mango, kiwi, and berries. \
         Respond warmly, under 30 words.",
        patient.scores.fruit
    )
}

fn coach_acknowledge_effort(patient: &PatientRecord) -> String {
    format!(
        "Someone with a fruit score of {}/10 is trying to improve. Acknowledge their effort and suggest \
         one small fruit-related action. Keep it uplifting and concise.",
        patient.scores.fruit
    )
}

const CONCISE: &str = "Keep each insight concise (max 20 words) and clinically focused.";
const FALLBACK: &str = "If no clear correlation is found, suggest the next most relevant or \
    interesting clinical insight based on the available data.";

fn pattern_fats_water_discretionary(patients: &[PatientRecord]) -> String {
    let summary = summarize(patients, |p| {
        format!(
            "Patient {} ({}): {}, {}, {}, {}, {}",
            p.patient_id,
            p.sex,
            score(p, "SatFat", ScoreCategory::SaturatedFat),
            score(p, "UnsatFat", ScoreCategory::UnsaturatedFat),
            score(p, "Water", ScoreCategory::Water),
            score(p, "Discretionary", ScoreCategory::DiscretionaryFoods),
            score(p, "Fruit", ScoreCategory::Fruit),
        )
    });
    format!(
        "You are a healthcare data analyst.\n\n\
         Based on the patient nutrition summary below:\n{summary}\n\n\
         Identify 3 clear patterns that relate to:\n\
         - Saturated and unsaturated fat intake\n\
         - Water and fruit consumption trends\n\
         - Overconsumption of discretionary foods\n\n\
         Write your answer as a numbered list (1-3), in a clinical tone.\n\
         Highlight only the top 3 most meaningful and actionable insights.\n\
         {FALLBACK}\n{CONCISE}"
    )
}

fn pattern_sugar_alcohol_sodium(patients: &[PatientRecord]) -> String {
    let summary = summarize(patients, |p| {
        format!(
            "User {} ({}): {}, {}, {}, {}, Score={}",
            p.patient_id,
            p.sex,
            score(p, "Sugar", ScoreCategory::Sugar),
            score(p, "Alcohol", ScoreCategory::Alcohol),
            score(p, "Sodium", ScoreCategory::Sodium),
            score(p, "Fruit", ScoreCategory::Fruit),
            p.total_score,
        )
    });
    format!(
        "You are analyzing nutrition risks based on sugar, alcohol, and sodium intake.\n\n\
         Dataset:\n{summary}\n\n\
         Provide 3 professional insights related to:\n\
         - High sugar/alcohol/sodium intake\n\
         - Fruit consumption and total score correlation\n\
         - Gender-based consumption patterns (if applicable)\n\n\
         Format your response as:\n1. ...\n2. ...\n3. ...\n\
         Highlight only the top 3 most meaningful insights.\n\
         {CONCISE}\n{FALLBACK}"
    )
}

fn pattern_nutrient_imbalance(patients: &[PatientRecord]) -> String {
    let summary = summarize(patients, |p| {
        format!(
            "ID {} ({}): {}, {}, {}, {}, {}",
            p.patient_id,
            p.sex,
            score(p, "WholeGrains", ScoreCategory::WholeGrains),
            score(p, "Dairy", ScoreCategory::DairyAndAlternatives),
            score(p, "MeatAlt", ScoreCategory::MeatAndAlternatives),
            score(p, "Vegetables", ScoreCategory::Vegetables),
            score(p, "Fruit", ScoreCategory::Fruit),
        )
    });
    format!(
        "You are analyzing nutrient imbalance in dietary data.\n\n\
         Based on:\n{summary}\n\n\
         Derive 3 insights regarding:\n\
         - Whole grain and dairy intake\n\
         - Balance between meat and plant-based foods\n\
         - Areas of improvement for fruit and vegetable diversity\n\n\
         {CONCISE}\n{FALLBACK}"
    )
}

fn pattern_hydration_fruit(patients: &[PatientRecord]) -> String {
    let summary = summarize(patients, |p| {
        format!(
            "Patient {}: {}, {}, TotalScore={}",
            p.patient_id,
            score(p, "Water", ScoreCategory::Water),
            score(p, "Fruit", ScoreCategory::Fruit),
            p.total_score,
        )
    });
    format!(
        "You are investigating the correlation between hydration, fruit intake, and overall diet quality.\n\n\
         Sample data:\n{summary}\n\n\
         Identify 3 interesting insights such as:\n\
         - Water and fruit intake's influence on overall score\n\
         - Outliers (e.g., high score with low hydration/fruit)\n\
         - Suggestions for hydration- and fruit-linked interventions\n\n\
         Format as 3 short, numbered paragraphs.\n\
         {CONCISE}\n{FALLBACK}"
    )
}

fn pattern_protein_sources(patients: &[PatientRecord]) -> String {
    let summary = summarize(patients, |p| {
        format!(
            "Patient {} ({}): {}, {}, {}, TotalScore={}",
            p.patient_id,
            p.sex,
            score(p, "MeatAlt", ScoreCategory::MeatAndAlternatives),
            score(p, "Dairy", ScoreCategory::DairyAndAlternatives),
            score(p, "WholeGrains", ScoreCategory::WholeGrains),
            p.total_score,
        )
    });
    format!(
        "You are investigating how patients obtain protein and whether they achieve a diverse balance of sources.\n\n\
         Sample data:\n{summary}\n\n\
         Identify 3 insights based on:\n\
         - Meat vs dairy protein balance\n\
         - Role of whole grains in protein contribution\n\
         - Gender-related variation, if any\n\n\
         Present your findings as 3 numbered insights.\n\
         Each should be concise (max 20 words), clinically meaningful, and suggest improvements if needed.\n\
         If no strong pattern is observed, mention another notable dietary imbalance found."
    )
}

fn pattern_low_scorers(patients: &[PatientRecord]) -> String {
    let mut sorted: Vec<&PatientRecord> = patients.iter().collect();
    sorted.sort_by(|a, b| a.total_score.total_cmp(&b.total_score));
    let summary = sorted
        .into_iter()
        .take(COHORT_SAMPLE_SIZE)
        .map(|p| {
            format!(
                "Patient {}: TotalScore={}, {}, {}, {}, {}, {}, {}",
                p.patient_id,
                p.total_score,
                score(p, "Veg", ScoreCategory::Vegetables),
                score(p, "Grains", ScoreCategory::GrainsAndCereals),
                score(p, "Discretionary", ScoreCategory::DiscretionaryFoods),
                score(p, "Water", ScoreCategory::Water),
                score(p, "Alcohol", ScoreCategory::Alcohol),
                score(p, "Sugars", ScoreCategory::Sugar),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are identifying at-risk patients based on their overall nutrition score.\n\n\
         Data below shows {COHORT_SAMPLE_SIZE} patients with the lowest HEIFA scores:\n{summary}\n\n\
         Derive 3 clinically meaningful insights by analyzing:\n\
         - Common deficiencies among low-score patients\n\
         - Over-consumed food types\n\
         - Any distinct patterns across the data\n\n\
         Present your insights as:\n1. ...\n2. ...\n3. ...\n\
         {CONCISE}\n\
         If no strong pattern is observed, describe any other notable dietary concern from the data."
    )
}

fn pattern_by_sex(patients: &[PatientRecord]) -> String {
    let groups: Vec<String> = [Sex::Male, Sex::Female]
        .into_iter()
        .filter_map(|sex| {
            let group: Vec<&PatientRecord> = patients.iter().filter(|p| p.sex == sex).collect();
            if group.is_empty() {
                return None;
            }
            let sample = group
                .iter()
                .take(GROUP_SAMPLE_SIZE)
                .map(|p| {
                    let scores = ScoreCategory::ALL
                        .iter()
                        .map(|c| format!("{}={}/{}", c.label(), p.scores.get(*c), c.max_score()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("Patient {} ({}): {}, Score={}", p.patient_id, p.sex, scores, p.total_score)
                })
                .collect::<Vec<_>>()
                .join("\n");
            Some(format!("Group: {} ({} patients)\n{}", sex, group.len(), sample))
        })
        .collect();
    let summary = groups.join("\n\n");
    format!(
        "You are a clinical data analyst reviewing nutrition data segmented by gender.\n\n\
         Grouped sample data:\n{summary}\n\n\
         Using the above data, derive 3 clinically relevant gender-based nutritional patterns.\n\n\
         Focus areas may include:\n\
         - Discretionary foods, fat, sodium, and alcohol intake\n\
         - Fruit, vegetable, whole grain, and dairy consumption\n\
         - Hydration and total diet score\n\n\
         Present your response in this format:\n1. [Insight]\n2. [Insight]\n3. [Insight]\n\
         Focus on the key 3 patterns only. {CONCISE}"
    )
}
