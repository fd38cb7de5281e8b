use serde::{Deserialize, Serialize};
use std::fmt;

/// Nutri-Score letter, A (best) through E (worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E];

    /// Band a (clamped) score. Each band includes its upper bound.
    pub fn from_score(score: i64) -> Self {
        match score {
            s if s <= -1 => Grade::A,
            s if s <= 2 => Grade::B,
            s if s <= 10 => Grade::C,
            s if s <= 18 => Grade::D,
            _ => Grade::E,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::E => 'E',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Grade::A => "Excellent nutritional quality - High in nutrients, low in calories, saturated fat, sugar, and salt",
            Grade::B => "Good nutritional quality - Generally healthy choice with minor nutritional concerns",
            Grade::C => "Fair nutritional quality - Moderate nutritional value, consume in moderation",
            Grade::D => "Poor nutritional quality - High in calories, saturated fat, sugar, or salt",
            Grade::E => "Very poor nutritional quality - Limit consumption, very high in unhealthy nutrients",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "E" => Ok(Grade::E),
            other => Err(format!("Unknown grade: '{other}'")),
        }
    }
}
