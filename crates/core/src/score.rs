use serde::{Deserialize, Serialize};

use crate::grade::Grade;
use crate::nutrient::{NutrientError, NutrientField, NutrientReading};

pub const MIN_SCORE: i64 = -15;
pub const MAX_SCORE: i64 = 40;

/// Divisors for the health-cost contributors.
const NEGATIVE_WEIGHTS: [(NutrientField, f64); 4] = [
    (NutrientField::EnergyKj, 335.0),
    (NutrientField::SugarG, 4.5),
    (NutrientField::SaturatedFatG, 1.0),
    (NutrientField::SodiumMg, 90.0),
];

/// Divisors for the health-benefit contributors.
const POSITIVE_WEIGHTS: [(NutrientField, f64); 2] = [
    (NutrientField::FiberG, 0.9),
    (NutrientField::ProteinG, 1.6),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Rounded and clamped score in `MIN_SCORE..=MAX_SCORE`.
    pub score: i64,
    pub grade: Grade,
    /// Unrounded sum of the health-cost contributions.
    pub negative_points: f64,
    /// Unrounded sum of the health-benefit contributions.
    pub positive_points: f64,
}

pub struct NutriScoreCalculator;

impl NutriScoreCalculator {
    /// Score a reading. Absent fields count as zero; negative or
    /// implausibly large values are rejected.
    pub fn score(reading: &NutrientReading) -> Result<ScoreResult, NutrientError> {
        reading.validate()?;

        let negative_points = weighted_sum(reading, &NEGATIVE_WEIGHTS);
        let positive_points = weighted_sum(reading, &POSITIVE_WEIGHTS);

        // Ties go to the even neighbour: 0.5 -> 0, 1.5 -> 2, -2.5 -> -2.
        let raw = (negative_points - positive_points).round_ties_even() as i64;
        let score = raw.clamp(MIN_SCORE, MAX_SCORE);

        Ok(ScoreResult {
            score,
            grade: Grade::from_score(score),
            negative_points,
            positive_points,
        })
    }
}

fn weighted_sum(reading: &NutrientReading, weights: &[(NutrientField, f64)]) -> f64 {
    weights
        .iter()
        .map(|(field, divisor)| reading.value_or_zero(*field) as f64 / divisor)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use NutrientField::*;

    fn score_of(reading: NutrientReading) -> i64 {
        NutriScoreCalculator::score(&reading).unwrap().score
    }

    fn sat_fat(grams: i64) -> NutrientReading {
        NutrientReading::new().with(SaturatedFatG, grams)
    }

    #[test]
    fn empty_reading_scores_zero_grade_b() {
        let r = NutriScoreCalculator::score(&NutrientReading::new()).unwrap();
        assert_eq!(r.score, 0);
        assert_eq!(r.grade, Grade::B);
        assert_eq!(r.negative_points, 0.0);
        assert_eq!(r.positive_points, 0.0);
    }

    #[test]
    fn full_label_example() {
        let reading = NutrientReading::new()
            .with(EnergyKj, 500)
            .with(SugarG, 12)
            .with(SaturatedFatG, 3)
            .with(SodiumMg, 200)
            .with(FiberG, 5)
            .with(ProteinG, 8);
        let r = NutriScoreCalculator::score(&reading).unwrap();
        assert!((r.negative_points - 9.381).abs() < 0.01, "neg was {}", r.negative_points);
        assert!((r.positive_points - 10.556).abs() < 0.01, "pos was {}", r.positive_points);
        assert_eq!(r.score, -1);
        assert_eq!(r.grade, Grade::A);
    }

    #[test]
    fn grade_boundaries() {
        // protein 2 -> -1.25 -> -1
        let r = NutriScoreCalculator::score(&NutrientReading::new().with(ProteinG, 2)).unwrap();
        assert_eq!((r.score, r.grade), (-1, Grade::A));

        for (grams, grade) in [(2, Grade::B), (10, Grade::C), (18, Grade::D), (19, Grade::E)] {
            let r = NutriScoreCalculator::score(&sat_fat(grams)).unwrap();
            assert_eq!((r.score, r.grade), (grams, grade));
        }
    }

    #[test]
    fn ties_round_to_even() {
        // sodium 45 mg contributes exactly 0.5
        let half = |fat: i64| sat_fat(fat).with(SodiumMg, 45);
        assert_eq!(score_of(half(0)), 0);
        assert_eq!(score_of(half(1)), 2);
        assert_eq!(score_of(half(2)), 2);
        assert_eq!(score_of(half(3)), 4);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(score_of(sat_fat(500)), MAX_SCORE);
        assert_eq!(score_of(NutrientReading::new().with(FiberG, 100)), MIN_SCORE);
    }

    #[test]
    fn score_and_grade_stay_in_range() {
        for energy in (0..=4000).step_by(500) {
            for fiber in (0..=60).step_by(15) {
                let reading = NutrientReading::new()
                    .with(EnergyKj, energy)
                    .with(SugarG, energy / 40)
                    .with(FiberG, fiber);
                let r = NutriScoreCalculator::score(&reading).unwrap();
                assert!((MIN_SCORE..=MAX_SCORE).contains(&r.score));
                assert_eq!(r.grade, Grade::from_score(r.score));
            }
        }
    }

    #[test]
    fn monotonic_in_each_field() {
        let base = NutrientReading::new()
            .with(EnergyKj, 800)
            .with(SugarG, 10)
            .with(SaturatedFatG, 4)
            .with(SodiumMg, 300)
            .with(FiberG, 3)
            .with(ProteinG, 6);

        for field in NutrientField::ALL {
            let increasing = matches!(field, EnergyKj | SugarG | SaturatedFatG | SodiumMg);
            let mut prev = score_of(base.clone().with(field, 0));
            for v in 1..=200 {
                let s = score_of(base.clone().with(field, v * 7));
                if increasing {
                    assert!(s >= prev, "{field} decreased score at {v}");
                } else {
                    assert!(s <= prev, "{field} increased score at {v}");
                }
                prev = s;
            }
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let reading = NutrientReading::new().with(SugarG, 22).with(ProteinG, 3);
        let a = NutriScoreCalculator::score(&reading).unwrap();
        let b = NutriScoreCalculator::score(&reading).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_negative_input() {
        let err = NutriScoreCalculator::score(&NutrientReading::new().with(SugarG, -4)).unwrap_err();
        assert_eq!(err, NutrientError::Negative { field: SugarG, value: -4 });
    }

    #[test]
    fn rejects_out_of_range_input() {
        let reading = NutrientReading::new().with(EnergyKj, i64::MAX);
        assert!(matches!(
            NutriScoreCalculator::score(&reading),
            Err(NutrientError::OutOfRange { field: EnergyKj, .. })
        ));
    }
}
