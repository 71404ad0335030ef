//! Nutrition resolution module
//!
//! Fuzzy ingredient matching, quantity normalization, aggregation and calibration.

pub mod aggregator;
pub mod converter;
pub mod engine;
pub mod matcher;
pub mod needs;
pub mod reference;
pub mod similarity;
pub mod units;

pub use aggregator::{
    aggregate, aggregate_parallel, calibration_scale, resolve_one, CalibrationParams,
    CalibrationPolicy, IngredientQuantity, ResolveContext,
};
pub use converter::{
    mass_fraction, normalize_quantity, parse_optional_quantity, parse_quantity, ParsedQuantity,
    UnmatchedUnitFallback, UNMATCHED_UNIT_MASS_FRACTION,
};
pub use engine::{EngineSettings, NutritionEngine, ResolvedIngredient};
pub use matcher::{match_ingredient, MatchResult, ACCEPTANCE_THRESHOLD};
pub use needs::{estimate_calorie_needs, ActivityLevel, CalorieNeeds, Sex};
pub use reference::{NutritionRecord, NutritionTable, ReferenceError, ALIAS_DELIMITER};
pub use similarity::{partial_ratio, ratio, score_all, token_set_ratio, token_sort_ratio, Metric};
pub use units::{match_unit, UnitConversionTable, UnitMatch, STANDARD_UNITS};
