use std::sync::OnceLock;

use nutriscan_core::{NutrientField, NutrientReading};
use regex::Regex;

// ── Pattern descriptors ──────────────────────────────────────────────────────

/// Declarative description of how one nutrient appears on a label.
#[derive(Debug, Clone, Copy)]
pub struct NutrientPattern {
    pub field: NutrientField,
    /// Label spellings, tried in order. Multi-word labels accept any
    /// whitespace between words.
    pub labels: &'static [&'static str],
    /// When true the label spellings must match exactly as written.
    pub case_sensitive_label: bool,
    /// Unit that may follow the number; always matched case-insensitively.
    pub unit: Option<&'static str>,
}

/// Separator between label and number: optional colon, any whitespace.
const SEPARATOR: &str = r"\s*:?\s*";

/// Shape of the captured value. Digits only, so "2.5" yields 2.
const VALUE: &str = r"([0-9]+)";

pub const PATTERNS: [NutrientPattern; 6] = [
    NutrientPattern {
        field: NutrientField::EnergyKj,
        labels: &["Energy", "ENERGY", "energy"],
        case_sensitive_label: true,
        unit: Some("kJ"),
    },
    NutrientPattern {
        field: NutrientField::SugarG,
        labels: &["Sugars", "Sugar"],
        case_sensitive_label: false,
        unit: None,
    },
    NutrientPattern {
        field: NutrientField::SaturatedFatG,
        labels: &["Saturated Fat", "Saturates"],
        case_sensitive_label: false,
        unit: None,
    },
    NutrientPattern {
        field: NutrientField::SodiumMg,
        labels: &["Sodium", "Salt"],
        case_sensitive_label: false,
        unit: None,
    },
    NutrientPattern {
        field: NutrientField::FiberG,
        labels: &["Fiber", "Fibre"],
        case_sensitive_label: false,
        unit: None,
    },
    NutrientPattern {
        field: NutrientField::ProteinG,
        labels: &["Protein"],
        case_sensitive_label: false,
        unit: None,
    },
];

impl NutrientPattern {
    /// Regex source for this descriptor.
    ///
    /// The label must begin on a word boundary and be followed directly by
    /// the separator, so "Unsaturated" and "Fibreglass" never match.
    pub fn to_regex_source(&self) -> String {
        let labels = self
            .labels
            .iter()
            .map(|label| {
                label
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");
        let flags = if self.case_sensitive_label { "" } else { "(?i)" };
        let unit = self
            .unit
            .map(|u| format!(r"(?:\s*(?i:{}))?", regex::escape(u)))
            .unwrap_or_default();
        format!(r"{flags}\b(?:{labels}){SEPARATOR}{VALUE}{unit}")
    }
}

// ── Compiled regex cache ─────────────────────────────────────────────────────

fn compiled_patterns() -> &'static [(NutrientField, Regex)] {
    static R: OnceLock<Vec<(NutrientField, Regex)>> = OnceLock::new();
    R.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|p| {
                let re = Regex::new(&p.to_regex_source()).expect("invalid nutrient pattern");
                (p.field, re)
            })
            .collect()
    })
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct NutrientExtractor;

impl NutrientExtractor {
    /// Extract nutrient values from raw OCR text. Fields with no match are
    /// left out of the reading.
    pub fn extract(ocr_text: &str) -> NutrientReading {
        compiled_patterns()
            .iter()
            .filter_map(|(field, re)| {
                let c = re.captures(ocr_text)?;
                Some((*field, parse_digits(c.get(1)?.as_str())))
            })
            .collect()
    }
}

/// Parse a run of ASCII digits, saturating rather than failing on overflow
/// so the field still counts as found.
fn parse_digits(digits: &str) -> i64 {
    digits.parse().unwrap_or(i64::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
