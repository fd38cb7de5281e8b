pub mod grade;
pub mod nutrient;
pub mod score;

pub use grade::Grade;
pub use nutrient::{NutrientError, NutrientField, NutrientReading, MAX_NUTRIENT_VALUE};
pub use score::{NutriScoreCalculator, ScoreResult, MAX_SCORE, MIN_SCORE};

/// Score a reading; see [`NutriScoreCalculator::score`].
pub fn calculate_nutriscore(reading: &NutrientReading) -> Result<ScoreResult, NutrientError> {
    NutriScoreCalculator::score(reading)
}
