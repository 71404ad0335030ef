//! Unit conversion table
//!
//! Household measures mapped to grams per unit, and fuzzy lookup of a parsed unit
//! token against them.

use serde::Serialize;

use super::matcher::ACCEPTANCE_THRESHOLD;
use super::similarity::ratio;

/// Standard measures, in lookup order. Exact-score ties keep the earlier entry.
pub const STANDARD_UNITS: &[(&str, f64)] = &[
    ("bát", 150.0),
    ("chén", 100.0),
    ("chút", 5.0),
    ("con", 100.0),
    ("cây", 30.0),
    ("củ", 50.0),
    ("gói", 100.0),
    ("hũ", 200.0),
    ("hộp", 250.0),
    ("khay", 300.0),
    ("lá", 1.0),
    ("lòng đỏ", 17.0),
    ("lòng trắng", 33.0),
    ("muỗng canh", 15.0),
    ("muỗng cà phê", 5.0),
    ("muỗng", 10.0),
    ("mớ", 100.0),
    ("nhánh", 5.0),
    ("nhúm", 2.0),
    ("que", 20.0),
    ("quả", 50.0),
    ("thìa canh", 15.0),
    ("thìa cà phê", 5.0),
    ("thìa nhỏ", 10.0),
    ("thìa", 10.0),
    ("trái", 50.0),
    ("vài viên", 30.0),
    ("xíu", 1.0),
    ("ít", 2.0),
    // liquids are taken as water, 1 ml = 1 g
    ("l", 1000.0),
    ("cái", 50.0),
    ("g", 1.0),
    ("gam", 1.0),
    ("kg", 1000.0),
    ("ml", 1.0),
    ("bông", 20.0),
    ("gr", 1.0),
    ("gram", 1.0),
    ("bộ khung", 500.0),
    ("lít", 1000.0),
    ("miếng", 50.0),
    ("viên", 10.0),
    ("bó", 100.0),
    ("lát", 20.0),
    ("mẩu", 10.0),
    ("tép", 5.0),
    ("bộ", 300.0),
    ("bịch", 200.0),
    ("chiếc", 100.0),
    ("cục nhỏ", 20.0),
    ("khúc", 100.0),
    ("lon", 200.0),
    ("nắm", 50.0),
    ("phần", 200.0),
    ("thìa cafe", 5.0),
    ("tô", 350.0),
    ("ống", 50.0),
];

/// Result of matching a unit token
#[derive(Debug, Clone, Serialize)]
pub struct UnitMatch {
    /// Matched table unit
    pub unit: Option<String>,
    pub score: f64,
    /// Grams per unit, 0 when unmatched
    pub grams_per_unit: f64,
}

impl UnitMatch {
    pub fn is_match(&self) -> bool {
        self.unit.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitEntry {
    pub unit: String,
    pub grams_per_unit: f64,
}

/// Immutable unit phrase -> grams table
#[derive(Debug, Clone)]
pub struct UnitConversionTable {
    entries: Vec<UnitEntry>,
}

impl UnitConversionTable {
    /// The built-in household measure table
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_UNITS.iter().copied())
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(unit, grams)| UnitEntry {
                    unit: unit.to_lowercase(),
                    grams_per_unit: grams,
                })
                .collect(),
        }
    }

    pub fn grams_per_unit(&self, unit: &str) -> Option<f64> {
        let unit = unit.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.unit == unit)
            .map(|e| e.grams_per_unit)
    }

    pub fn entries(&self) -> &[UnitEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UnitConversionTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fuzzy-match a unit token using [`ratio`] alone.
///
/// The best-scoring entry is accepted if its score is above the acceptance threshold;
/// otherwise the result is unmatched with a zero factor.
pub fn match_unit(unit: &str, table: &UnitConversionTable) -> UnitMatch {
    let mut best: Option<&UnitEntry> = None;
    let mut max_score = 0.0;

    for entry in table.entries() {
        let score = ratio(unit, &entry.unit);
        if score > max_score {
            max_score = score;
            best = Some(entry);
        }
    }

    match best {
        Some(entry) if max_score > ACCEPTANCE_THRESHOLD => UnitMatch {
            unit: Some(entry.unit.clone()),
            score: max_score,
            grams_per_unit: entry.grams_per_unit,
        },
        _ => UnitMatch {
            unit: None,
            score: max_score,
            grams_per_unit: 0.0,
        },
    }
}
