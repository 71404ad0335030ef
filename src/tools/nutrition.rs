//! Nutrition MCP Tools
//!
//! Stateless lookups against the loaded reference dataset.

use serde::Serialize;

use crate::models::Nutrition;
use crate::nutrition::{
    estimate_calorie_needs, ActivityLevel, CalorieNeeds, IngredientQuantity, NutritionEngine,
    ParsedQuantity, ResolvedIngredient, Sex, ACCEPTANCE_THRESHOLD,
};

/// Response for match_ingredient
#[derive(Debug, Serialize)]
pub struct MatchIngredientResponse {
    pub name: String,
    pub matched: bool,
    pub key: Option<String>,
    pub alias: Option<String>,
    pub score: f64,
    pub threshold: f64,
    /// Per 100 g; zero when unmatched
    pub nutrition_per_100g: Nutrition,
}

/// Response for normalize_quantity
#[derive(Debug, Serialize)]
pub struct NormalizeQuantityResponse {
    pub quantity: Option<String>,
    pub parsed: ParsedQuantity,
    pub matched_unit: Option<String>,
    pub unit_score: f64,
    /// 0 when the unit is not recognised
    pub grams_per_unit: f64,
    /// Multiplier applied to per-100g values
    pub mass_fraction: f64,
}

/// Response for calculate_nutrition
#[derive(Debug, Serialize)]
pub struct CalculateNutritionResponse {
    pub ingredients: Vec<ResolvedIngredient>,
    pub unmatched: Vec<String>,
    pub raw_total: Nutrition,
    pub calibrated_total: Nutrition,
}

/// Response for estimate_meal_calories
#[derive(Debug, Serialize)]
pub struct MealCaloriesResponse {
    pub sex: Sex,
    pub weight_kg: f64,
    pub activity: ActivityLevel,
    #[serde(flatten)]
    pub needs: CalorieNeeds,
}

pub fn match_ingredient(engine: &NutritionEngine, name: &str) -> MatchIngredientResponse {
    let result = engine.match_ingredient(name);
    MatchIngredientResponse {
        name: name.to_string(),
        matched: result.is_match(),
        key: result.key,
        alias: result.alias,
        score: result.score,
        threshold: ACCEPTANCE_THRESHOLD,
        nutrition_per_100g: result.nutrition,
    }
}

pub fn parse_quantity(engine: &NutritionEngine, quantity: Option<&str>) -> ParsedQuantity {
    engine.parse_quantity(quantity)
}

pub fn normalize_quantity(engine: &NutritionEngine, quantity: Option<&str>) -> NormalizeQuantityResponse {
    let parsed = engine.parse_quantity(quantity);
    let unit = engine.match_unit(&parsed.unit);
    let fraction = engine.normalize_quantity(quantity);

    NormalizeQuantityResponse {
        quantity: quantity.map(str::to_string),
        parsed,
        matched_unit: unit.unit,
        unit_score: unit.score,
        grams_per_unit: unit.grams_per_unit,
        mass_fraction: fraction,
    }
}

/// Per-ingredient breakdown plus raw and calibrated totals
pub fn calculate_nutrition(
    engine: &NutritionEngine,
    ingredients: &[IngredientQuantity],
) -> CalculateNutritionResponse {
    let breakdown: Vec<ResolvedIngredient> = engine.explain_all(ingredients);

    let unmatched = breakdown
        .iter()
        .filter(|r| r.matched_key.is_none())
        .map(|r| r.name.clone())
        .collect();

    let raw_total: Nutrition = breakdown.iter().map(|r| r.nutrition).sum();
    let calibrated_total = engine.calibrate(raw_total);

    CalculateNutritionResponse {
        ingredients: breakdown,
        unmatched,
        raw_total: raw_total.rounded(),
        calibrated_total: calibrated_total.rounded(),
    }
}

pub fn estimate_meal_calories(
    sex: &str,
    weight_kg: f64,
    activity: Option<&str>,
) -> Result<MealCaloriesResponse, String> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err("weight_kg must be greater than 0".to_string());
    }

    let sex = Sex::parse(sex);
    let activity = activity.map(ActivityLevel::parse).unwrap_or_default();

    Ok(MealCaloriesResponse {
        sex,
        weight_kg,
        activity,
        needs: estimate_calorie_needs(sex, weight_kg, activity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::reference::tests::sample_table;
    use crate::nutrition::{EngineSettings, UnitConversionTable};

    fn engine() -> NutritionEngine {
        NutritionEngine::new(sample_table(), UnitConversionTable::standard(), EngineSettings::default())
    }

    #[test]
    fn test_match_ingredient_response() {
        let e = engine();
        let hit = match_ingredient(&e, "Thịt bò");
        assert!(hit.matched);
        assert_eq!(hit.key.as_deref(), Some("thịt bò - thịt bò loại i"));
        assert_eq!(hit.nutrition_per_100g.protein, 21.0);

        let miss = match_ingredient(&e, "xq zvbk wpl");
        assert!(!miss.matched);
        assert!(miss.nutrition_per_100g.is_zero());
    }

    #[test]
    fn test_normalize_quantity_response() {
        let e = engine();
        let response = normalize_quantity(&e, Some("1 bát"));
        assert_eq!(response.matched_unit.as_deref(), Some("bát"));
        assert_eq!(response.grams_per_unit, 150.0);
        assert!((response.mass_fraction - 1.5).abs() < 1e-12);

        let missing = normalize_quantity(&e, None);
        assert_eq!(missing.parsed.amount, 0.0);
        assert_eq!(missing.mass_fraction, 0.0);
    }

    #[test]
    fn test_calculate_nutrition() {
        let e = engine();
        let response = calculate_nutrition(
            &e,
            &[
                IngredientQuantity::new("trứng gà", "2 quả"),
                IngredientQuantity::new("xq zvbk wpl", "100 g"),
            ],
        );
        assert_eq!(response.ingredients.len(), 2);
        assert_eq!(response.unmatched, vec!["xq zvbk wpl".to_string()]);
        assert_eq!(response.raw_total.calories, 166.0);
        assert_eq!(response.calibrated_total, response.raw_total);
    }

    #[test]
    fn test_calculate_nutrition_totals_match_breakdown() {
        let e = engine();
        let ingredients = [
            IngredientQuantity::new("gạo tẻ", "3 bát"),
            IngredientQuantity::new("thịt bò", "200 g"),
            IngredientQuantity::new("muối", "1 nhúm"),
        ];
        let response = calculate_nutrition(&e, &ingredients);
        let summed: Nutrition = response.ingredients.iter().map(|r| r.nutrition).sum();
        assert_eq!(response.raw_total, summed.rounded());
        assert_eq!(response.raw_total, e.aggregate(&ingredients).rounded());
        assert_eq!(response.calibrated_total, e.recipe_totals(&ingredients).rounded());
    }

    #[test]
    fn test_calculate_nutrition_empty() {
        let response = calculate_nutrition(&engine(), &[]);
        assert!(response.raw_total.is_zero());
        assert!(response.calibrated_total.is_zero());
    }

    #[test]
    fn test_estimate_meal_calories() {
        let response = estimate_meal_calories("male", 60.0, None).unwrap();
        assert_eq!(response.activity, ActivityLevel::Moderate);
        assert!((response.needs.per_meal - 972.0).abs() < 1e-9);
        assert!(estimate_meal_calories("female", 0.0, Some("low")).is_err());
    }
}
