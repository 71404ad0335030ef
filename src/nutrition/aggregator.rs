//! Nutrition aggregation and calibration
//!
//! Per-ingredient contributions, recipe sums, and the calibration remap applied
//! to recipe totals.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::converter::{normalize_quantity, UnmatchedUnitFallback};
use super::matcher::match_ingredient;
use super::reference::NutritionTable;
use super::units::UnitConversionTable;
use crate::models::Nutrition;

/// One ingredient line of a recipe: freeform name and quantity text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientQuantity {
    pub name: String,
    pub quantity: Option<String>,
}

impl IngredientQuantity {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: Some(quantity.into()),
        }
    }
}

/// Borrowed view of everything a resolution needs
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub reference: &'a NutritionTable,
    pub units: &'a UnitConversionTable,
    pub fallback: UnmatchedUnitFallback,
}

/// Nutrition contributed by one ingredient: per-100g values times its mass fraction
pub fn resolve_one(ctx: &ResolveContext<'_>, name: &str, quantity: Option<&str>) -> Nutrition {
    let per_100g = match_ingredient(name, ctx.reference).nutrition;
    let fraction = normalize_quantity(quantity, ctx.units, ctx.fallback);
    per_100g.scale(fraction)
}

/// Slot-wise sum over all ingredients. Empty input gives zero.
pub fn aggregate(ctx: &ResolveContext<'_>, ingredients: &[IngredientQuantity]) -> Nutrition {
    ingredients
        .iter()
        .map(|i| resolve_one(ctx, &i.name, i.quantity.as_deref()))
        .sum()
}

/// [`aggregate`] with ingredients resolved on the rayon pool.
///
/// The reduction order is not fixed, so compare results with a tolerance.
pub fn aggregate_parallel(ctx: &ResolveContext<'_>, ingredients: &[IngredientQuantity]) -> Nutrition {
    ingredients
        .par_iter()
        .map(|i| resolve_one(ctx, &i.name, i.quantity.as_deref()))
        .reduce(Nutrition::zero, |a, b| a + b)
}

/// Parameters of the calibration remap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Output at `x_min`
    pub a: f64,
    /// Output at `x_max`
    pub b: f64,
    pub x_min: f64,
    pub x_max: f64,
    /// Values up to here pass through unchanged
    pub identity_max: f64,
    /// Cap outputs at `b` for inputs above `x_max`
    pub clamp: bool,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            a: 800.0,
            b: 1500.0,
            x_min: 500.0,
            x_max: 3000.0,
            identity_max: 1000.0,
            clamp: false,
        }
    }
}

/// Identity up to `identity_max`, then the linear map of `[x_min, x_max]` onto `[a, b]`.
///
/// Without `clamp`, inputs above `x_max` extrapolate past `b`.
pub fn calibration_scale(x: f64, params: &CalibrationParams) -> f64 {
    if x <= params.identity_max {
        return x;
    }
    if params.clamp && x > params.x_max {
        return params.b;
    }
    params.a + (x - params.x_min) * (params.b - params.a) / (params.x_max - params.x_min)
}

/// Which recipe total slots receive [`calibration_scale`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPolicy {
    /// Energy only; protein, fat and carbohydrate stay raw
    #[default]
    EnergyOnly,
    AllMacros,
}

impl std::str::FromStr for CalibrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "energy" | "energy_only" | "calories" => Ok(CalibrationPolicy::EnergyOnly),
            "all" | "all_macros" => Ok(CalibrationPolicy::AllMacros),
            other => Err(format!("unknown calibration policy '{}'", other)),
        }
    }
}

impl CalibrationPolicy {
    pub fn apply(&self, total: Nutrition, params: &CalibrationParams) -> Nutrition {
        match self {
            CalibrationPolicy::EnergyOnly => Nutrition {
                calories: calibration_scale(total.calories, params),
                ..total
            },
            CalibrationPolicy::AllMacros => total.map(|v| calibration_scale(v, params)),
        }
    }
}
