use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Upper bound accepted for any single nutrient quantity.
///
/// Per-100 g label values never come close: pure salt is ~39 300 mg sodium
/// and pure fat ~3 700 kJ.
pub const MAX_NUTRIENT_VALUE: i64 = 100_000;

/// The six quantities read off a nutrition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NutrientField {
    #[serde(rename = "energy_kJ")]
    EnergyKj,
    #[serde(rename = "sugar_g")]
    SugarG,
    #[serde(rename = "saturated_fat_g")]
    SaturatedFatG,
    #[serde(rename = "sodium_mg")]
    SodiumMg,
    #[serde(rename = "fiber_g")]
    FiberG,
    #[serde(rename = "protein_g")]
    ProteinG,
}

impl NutrientField {
    pub const ALL: [NutrientField; 6] = [
        NutrientField::EnergyKj,
        NutrientField::SugarG,
        NutrientField::SaturatedFatG,
        NutrientField::SodiumMg,
        NutrientField::FiberG,
        NutrientField::ProteinG,
    ];

    /// Wire name of the field, e.g. `energy_kJ`.
    pub fn key(self) -> &'static str {
        match self {
            NutrientField::EnergyKj => "energy_kJ",
            NutrientField::SugarG => "sugar_g",
            NutrientField::SaturatedFatG => "saturated_fat_g",
            NutrientField::SodiumMg => "sodium_mg",
            NutrientField::FiberG => "fiber_g",
            NutrientField::ProteinG => "protein_g",
        }
    }

    /// Human-readable label with unit, e.g. `Energy (kJ)`.
    pub fn label(self) -> &'static str {
        match self {
            NutrientField::EnergyKj => "Energy (kJ)",
            NutrientField::SugarG => "Sugar (g)",
            NutrientField::SaturatedFatG => "Saturated Fat (g)",
            NutrientField::SodiumMg => "Sodium (mg)",
            NutrientField::FiberG => "Fiber (g)",
            NutrientField::ProteinG => "Protein (g)",
        }
    }
}

impl fmt::Display for NutrientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for NutrientField {
    type Err = NutrientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NutrientField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| NutrientError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NutrientError {
    #[error("Unknown nutrient field: '{0}'")]
    UnknownField(String),
    #[error("Nutrient {field} must not be negative (got {value})")]
    Negative { field: NutrientField, value: i64 },
    #[error("Nutrient {field} is out of range: {value} exceeds {max}")]
    OutOfRange { field: NutrientField, value: i64, max: i64 },
}

/// Nutrient values keyed by field. A field absent from the map was not
/// found, which is distinct from a field found with value zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutrientReading(BTreeMap<NutrientField, i64>);

impl NutrientReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a reading from string keys, rejecting names outside the
    /// six-field vocabulary.
    pub fn from_named<I, K>(entries: I) -> Result<Self, NutrientError>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut reading = Self::new();
        for (name, value) in entries {
            let field: NutrientField = name.as_ref().parse()?;
            reading.insert(field, value);
        }
        Ok(reading)
    }

    pub fn with(mut self, field: NutrientField, value: i64) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: NutrientField, value: i64) -> Option<i64> {
        self.0.insert(field, value)
    }

    pub fn get(&self, field: NutrientField) -> Option<i64> {
        self.0.get(&field).copied()
    }

    /// The value used for scoring: absent fields count as zero.
    pub fn value_or_zero(&self, field: NutrientField) -> i64 {
        self.get(field).unwrap_or(0)
    }

    pub fn contains(&self, field: NutrientField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Fields that were not found, in canonical order.
    pub fn missing(&self) -> Vec<NutrientField> {
        NutrientField::ALL
            .into_iter()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientField, i64)> + '_ {
        self.0.iter().map(|(f, v)| (*f, *v))
    }

    /// Check every present value against the accepted range.
    pub fn validate(&self) -> Result<(), NutrientError> {
        for (field, value) in self.iter() {
            if value < 0 {
                return Err(NutrientError::Negative { field, value });
            }
            if value > MAX_NUTRIENT_VALUE {
                return Err(NutrientError::OutOfRange {
                    field,
                    value,
                    max: MAX_NUTRIENT_VALUE,
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(NutrientField, i64)> for NutrientReading {
    fn from_iter<T: IntoIterator<Item = (NutrientField, i64)>>(iter: T) -> Self {
        NutrientReading(iter.into_iter().collect())
    }
}
