//! Quantity parsing and mass normalization
//!
//! Turns freeform quantity text ("2,5 kg", "1 quả", "200g") into a mass fraction:
//! grams divided by 100, the basis of the per-100g reference values.

use serde::{Deserialize, Serialize};

use super::units::{match_unit, UnitConversionTable};

/// Unit assumed for bare numbers and unparsable text
pub const DEFAULT_UNIT: &str = "g";

/// Mass fraction used when the unit matches nothing in the table
pub const UNMATCHED_UNIT_MASS_FRACTION: f64 = 0.01;

/// An amount and its lowercase unit token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuantity {
    pub amount: f64,
    pub unit: String,
}

impl ParsedQuantity {
    fn new(amount: f64, unit: &str) -> Self {
        Self {
            amount,
            unit: unit.to_string(),
        }
    }

    /// Zero grams: the result for text that is not a quantity
    pub fn fallback() -> Self {
        Self::new(0.0, DEFAULT_UNIT)
    }
}

/// What [`normalize_quantity`] returns when the unit is not recognised
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "fraction", rename_all = "snake_case")]
pub enum UnmatchedUnitFallback {
    /// The fraction itself, regardless of amount
    Fixed(f64),
    /// The fraction times the parsed amount
    PerAmount(f64),
}

impl UnmatchedUnitFallback {
    pub fn mass_fraction(&self, amount: f64) -> f64 {
        match *self {
            UnmatchedUnitFallback::Fixed(fraction) => fraction,
            UnmatchedUnitFallback::PerAmount(fraction) => fraction * amount,
        }
    }
}

impl Default for UnmatchedUnitFallback {
    fn default() -> Self {
        UnmatchedUnitFallback::Fixed(UNMATCHED_UNIT_MASS_FRACTION)
    }
}

/// Parse a number that may use a comma as the decimal separator
fn parse_locale_number(s: &str) -> Option<f64> {
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Split quantity text into amount and unit.
///
/// - `"<number><ws?><unit>"`: the number (digits, `,` or `.`) and the trimmed, lowercased rest
/// - a bare number: that amount in grams
/// - anything else: `(0, "g")`
pub fn parse_quantity(text: &str) -> ParsedQuantity {
    let trimmed = text.trim();

    let number_end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == ',' || *c == '.'))
        .map_or(trimmed.len(), |(i, _)| i);
    let (number, rest) = trimmed.split_at(number_end);
    let unit = rest.trim();

    if !number.is_empty() && !unit.is_empty() {
        return match parse_locale_number(number) {
            Some(amount) => ParsedQuantity {
                amount,
                unit: unit.to_lowercase(),
            },
            None => ParsedQuantity::fallback(),
        };
    }

    match parse_locale_number(trimmed) {
        Some(amount) => ParsedQuantity::new(amount, DEFAULT_UNIT),
        None => ParsedQuantity::fallback(),
    }
}

/// [`parse_quantity`] for a possibly missing value
pub fn parse_optional_quantity(text: Option<&str>) -> ParsedQuantity {
    text.map_or_else(ParsedQuantity::fallback, parse_quantity)
}

/// Mass fraction of a parsed quantity: `amount * grams_per_unit / 100`.
///
/// Units with no table match fall back to `fallback` instead of zero.
pub fn mass_fraction(
    parsed: &ParsedQuantity,
    units: &UnitConversionTable,
    fallback: UnmatchedUnitFallback,
) -> f64 {
    let unit_match = match_unit(&parsed.unit, units);
    if unit_match.grams_per_unit > 0.0 {
        parsed.amount * unit_match.grams_per_unit / 100.0
    } else {
        tracing::warn!(
            "Unit '{}' not recognised (best score {:.1}); using fallback mass fraction",
            parsed.unit,
            unit_match.score
        );
        fallback.mass_fraction(parsed.amount)
    }
}

/// Parse and normalize quantity text in one step
pub fn normalize_quantity(
    text: Option<&str>,
    units: &UnitConversionTable,
    fallback: UnmatchedUnitFallback,
) -> f64 {
    mass_fraction(&parse_optional_quantity(text), units, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> f64 {
        normalize_quantity(
            Some(text),
            &UnitConversionTable::standard(),
            UnmatchedUnitFallback::default(),
        )
    }

    #[test]
    fn test_parse_comma_decimal() {
        assert_eq!(parse_quantity("2,5 kg"), ParsedQuantity::new(2.5, "kg"));
    }

    #[test]
    fn test_parse_attached_unit() {
        assert_eq!(parse_quantity("200g"), ParsedQuantity::new(200.0, "g"));
        assert_eq!(parse_quantity("  1.5 Muỗng Canh "), ParsedQuantity::new(1.5, "muỗng canh"));
    }

    #[test]
    fn test_parse_bare_number() {
        assert_eq!(parse_quantity("200"), ParsedQuantity::new(200.0, "g"));
        assert_eq!(parse_quantity("0,5"), ParsedQuantity::new(0.5, "g"));
    }

    #[test]
    fn test_parse_non_numeric() {
        assert_eq!(parse_quantity("vừa đủ"), ParsedQuantity::fallback());
        assert_eq!(parse_quantity(""), ParsedQuantity::fallback());
        assert_eq!(parse_quantity("nan"), ParsedQuantity::fallback());
        assert_eq!(parse_quantity("1.2.3 kg"), ParsedQuantity::fallback());
        assert_eq!(parse_optional_quantity(None), ParsedQuantity::fallback());
    }

    #[test]
    fn test_normalize_grams() {
        assert!((normalize("200g") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_household_unit() {
        assert!((normalize("2 muỗng canh") - 0.3).abs() < 1e-12);
        assert!((normalize("1 quả") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_unparsable_is_zero() {
        // (0, "g") -> zero grams, not the unit fallback
        assert_eq!(normalize("một ít"), 0.0);
        assert_eq!(normalize_quantity(None, &UnitConversionTable::standard(), UnmatchedUnitFallback::default()), 0.0);
    }

    #[test]
    fn test_unmatched_unit_fixed_fallback() {
        assert_eq!(normalize("3 zzqx"), UNMATCHED_UNIT_MASS_FRACTION);
        assert_eq!(normalize("1 zzqx"), UNMATCHED_UNIT_MASS_FRACTION);
    }

    #[test]
    fn test_unmatched_unit_per_amount_fallback() {
        let units = UnitConversionTable::standard();
        let fallback = UnmatchedUnitFallback::PerAmount(UNMATCHED_UNIT_MASS_FRACTION);
        let fraction = normalize_quantity(Some("3 zzqx"), &units, fallback);
        assert!((fraction - 0.03).abs() < 1e-12);
        assert!(fraction > 0.0);
    }
}
