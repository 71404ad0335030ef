//! Shared resolution context
//!
//! Holds the reference dataset, the unit table and the engine settings behind one
//! `Arc`. Built once at startup; every resolution borrows it read-only.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::aggregator::{
    aggregate, aggregate_parallel, resolve_one, CalibrationParams, CalibrationPolicy,
    IngredientQuantity, ResolveContext,
};
use super::converter::{mass_fraction, parse_optional_quantity, ParsedQuantity, UnmatchedUnitFallback};
use super::matcher::{match_ingredient, MatchResult};
use super::reference::{NutritionTable, ReferenceError};
use super::units::{match_unit, UnitConversionTable, UnitMatch};
use crate::models::Nutrition;

/// Tunables applied uniformly by every entry point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub calibration: CalibrationParams,
    pub policy: CalibrationPolicy,
    pub unmatched_unit: UnmatchedUnitFallback,
}

struct EngineInner {
    reference: NutritionTable,
    units: UnitConversionTable,
    settings: EngineSettings,
}

/// Per-ingredient breakdown returned alongside totals
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedIngredient {
    pub name: String,
    pub quantity: Option<String>,
    pub matched_key: Option<String>,
    pub match_score: f64,
    pub parsed: ParsedQuantity,
    pub matched_unit: Option<String>,
    pub mass_fraction: f64,
    pub nutrition: Nutrition,
}

/// Cheaply clonable read-only handle
#[derive(Clone)]
pub struct NutritionEngine {
    inner: Arc<EngineInner>,
}

impl NutritionEngine {
    pub fn new(reference: NutritionTable, units: UnitConversionTable, settings: EngineSettings) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                reference,
                units,
                settings,
            }),
        }
    }

    /// Load the reference dataset and pair it with the standard unit table
    pub fn load<P: AsRef<Path>>(reference_path: P, settings: EngineSettings) -> Result<Self, ReferenceError> {
        let reference = NutritionTable::load(reference_path)?;
        Ok(Self::new(reference, UnitConversionTable::standard(), settings))
    }

    fn context(&self) -> ResolveContext<'_> {
        ResolveContext {
            reference: &self.inner.reference,
            units: &self.inner.units,
            fallback: self.inner.settings.unmatched_unit,
        }
    }

    pub fn reference(&self) -> &NutritionTable {
        &self.inner.reference
    }

    pub fn units(&self) -> &UnitConversionTable {
        &self.inner.units
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    pub fn match_ingredient(&self, name: &str) -> MatchResult {
        match_ingredient(name, &self.inner.reference)
    }

    pub fn parse_quantity(&self, text: Option<&str>) -> ParsedQuantity {
        parse_optional_quantity(text)
    }

    pub fn match_unit(&self, unit: &str) -> UnitMatch {
        match_unit(unit, &self.inner.units)
    }

    pub fn normalize_quantity(&self, text: Option<&str>) -> f64 {
        mass_fraction(
            &parse_optional_quantity(text),
            &self.inner.units,
            self.inner.settings.unmatched_unit,
        )
    }

    pub fn resolve_one(&self, name: &str, quantity: Option<&str>) -> Nutrition {
        resolve_one(&self.context(), name, quantity)
    }

    /// Full breakdown for one ingredient line
    pub fn explain(&self, ingredient: &IngredientQuantity) -> ResolvedIngredient {
        let matched = self.match_ingredient(&ingredient.name);
        let parsed = self.parse_quantity(ingredient.quantity.as_deref());
        let unit = self.match_unit(&parsed.unit);
        let fraction = mass_fraction(&parsed, &self.inner.units, self.inner.settings.unmatched_unit);

        ResolvedIngredient {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity.clone(),
            matched_key: matched.key,
            match_score: matched.score,
            parsed,
            matched_unit: unit.unit,
            mass_fraction: fraction,
            nutrition: matched.nutrition.scale(fraction),
        }
    }

    /// [`explain`](Self::explain) for every line, in input order
    pub fn explain_all(&self, ingredients: &[IngredientQuantity]) -> Vec<ResolvedIngredient> {
        ingredients.par_iter().map(|i| self.explain(i)).collect()
    }

    /// Raw sum over the ingredient list
    pub fn aggregate(&self, ingredients: &[IngredientQuantity]) -> Nutrition {
        aggregate(&self.context(), ingredients)
    }

    pub fn aggregate_parallel(&self, ingredients: &[IngredientQuantity]) -> Nutrition {
        aggregate_parallel(&self.context(), ingredients)
    }

    /// Apply the configured calibration policy to a raw total
    pub fn calibrate(&self, total: Nutrition) -> Nutrition {
        let settings = &self.inner.settings;
        settings.policy.apply(total, &settings.calibration)
    }

    /// Aggregate then calibrate: the value a recipe displays
    pub fn recipe_totals(&self, ingredients: &[IngredientQuantity]) -> Nutrition {
        self.calibrate(self.aggregate_parallel(ingredients))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::reference::tests::sample_table;

    fn engine(settings: EngineSettings) -> NutritionEngine {
        NutritionEngine::new(sample_table(), UnitConversionTable::standard(), settings)
    }

    #[test]
    fn test_engine_is_shared_handle() {
        let a = engine(EngineSettings::default());
        let b = a.clone();
        assert!(std::ptr::eq(a.reference(), b.reference()));
    }

    #[test]
    fn test_normalize_via_engine() {
        let e = engine(EngineSettings::default());
        assert!((e.normalize_quantity(Some("200g")) - 2.0).abs() < 1e-12);
        assert!((e.normalize_quantity(Some("2 muỗng canh")) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_recipe_totals_energy_only() {
        let e = engine(EngineSettings::default());
        // 1 kg of rice: 3440 kcal, 79 g protein
        let ingredients = vec![IngredientQuantity::new("gạo tẻ", "1 kg")];
        let raw = e.aggregate(&ingredients);
        let totals = e.recipe_totals(&ingredients);
        assert!((raw.calories - 3440.0).abs() < 1e-9);
        assert!((totals.calories - (800.0 + 2940.0 * 700.0 / 2500.0)).abs() < 1e-9);
        assert!((totals.protein - raw.protein).abs() < 1e-9);
    }

    #[test]
    fn test_recipe_totals_all_macros() {
        let settings = EngineSettings {
            policy: CalibrationPolicy::AllMacros,
            ..EngineSettings::default()
        };
        let e = engine(settings);
        let ingredients = vec![IngredientQuantity::new("gạo tẻ", "1 kg")];
        let totals = e.recipe_totals(&ingredients);
        // carbs 759 g stay under the identity threshold
        assert!((totals.carbs - 759.0).abs() < 1e-9);
        assert!(totals.calories < 3440.0);
    }

    #[test]
    fn test_explain() {
        let e = engine(EngineSettings::default());
        let resolved = e.explain(&IngredientQuantity::new("Trứng gà", "2 quả"));
        assert_eq!(resolved.matched_key.as_deref(), Some("trứng gà - trứng gà ta"));
        assert_eq!(resolved.matched_unit.as_deref(), Some("quả"));
        assert!((resolved.mass_fraction - 1.0).abs() < 1e-12);
        assert!((resolved.nutrition.calories - 166.0).abs() < 1e-9);
    }

    #[test]
    fn test_random_name_resolves_to_zero() {
        let e = engine(EngineSettings::default());
        assert!(e.resolve_one("xq zvbk wpl", Some("300 g")).is_zero());
    }

    #[test]
    fn test_explain_all_keeps_order_and_sums_to_aggregate() {
        let e = engine(EngineSettings::default());
        let ingredients = [
            IngredientQuantity::new("gạo tẻ", "2 bát"),
            IngredientQuantity::new("trứng gà", "3 quả"),
            IngredientQuantity::new("nước mắm", "1 muỗng canh"),
        ];
        let breakdown = e.explain_all(&ingredients);
        let names: Vec<&str> = breakdown.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["gạo tẻ", "trứng gà", "nước mắm"]);

        let summed: Nutrition = breakdown.iter().map(|r| r.nutrition).sum();
        assert!(summed.approx_eq(&e.aggregate(&ingredients), 1e-9));
    }
}
