//! Recipe ingredient model
//!
//! Freeform ingredient lines of a recipe, and the compute-once nutrition lookup.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{IngredientQuantity, NutritionEngine};
use super::{Nutrition, Recipe};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub position: i64,
    pub name: String,
    pub quantity: Option<String>,
}

impl RecipeIngredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            position: row.get("position")?,
            name: row.get("name")?,
            quantity: row.get("quantity")?,
        })
    }

    /// Append ingredient lines after any existing ones
    pub fn append(
        conn: &Connection,
        recipe_id: i64,
        ingredients: &[IngredientQuantity],
    ) -> DbResult<Vec<Self>> {
        let next_position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM recipe_ingredients WHERE recipe_id = ?1",
            [recipe_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "INSERT INTO recipe_ingredients (recipe_id, position, name, quantity) VALUES (?1, ?2, ?3, ?4)",
        )?;

        let mut created = Vec::with_capacity(ingredients.len());
        for (offset, ingredient) in ingredients.iter().enumerate() {
            let position = next_position + offset as i64;
            stmt.execute(params![recipe_id, position, ingredient.name, ingredient.quantity])?;
            created.push(Self {
                id: conn.last_insert_rowid(),
                recipe_id,
                position,
                name: ingredient.name.clone(),
                quantity: ingredient.quantity.clone(),
            });
        }
        Ok(created)
    }

    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY position ASC",
        )?;
        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    pub fn count_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE recipe_id = ?1",
            [recipe_id],
            |row| row.get(0),
        )?)
    }

    pub fn to_pair(&self) -> IngredientQuantity {
        IngredientQuantity {
            name: self.name.clone(),
            quantity: self.quantity.clone(),
        }
    }
}

/// Recipe nutrition as returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct RecipeNutrition {
    pub recipe_id: i64,
    pub nutrition: Nutrition,
    /// True when this call computed and stored the value
    pub computed_now: bool,
    pub computed_at: Option<String>,
}

/// Stored nutrition for a recipe, computing and persisting it on first request.
///
/// Once stored, values are returned as-is and never recomputed, even if the
/// ingredients or reference data change later. A recipe without ingredients
/// reports zeros and stores nothing.
pub fn resolve_recipe_nutrition(
    conn: &Connection,
    engine: &NutritionEngine,
    recipe_id: i64,
) -> DbResult<RecipeNutrition> {
    let recipe = Recipe::get_by_id(conn, recipe_id)?.ok_or(DbError::NotFound("Recipe", recipe_id))?;

    if let Some(nutrition) = recipe.nutrition {
        return Ok(RecipeNutrition {
            recipe_id,
            nutrition,
            computed_now: false,
            computed_at: recipe.nutrition_computed_at,
        });
    }

    let pairs: Vec<IngredientQuantity> = RecipeIngredient::get_for_recipe(conn, recipe_id)?
        .iter()
        .map(RecipeIngredient::to_pair)
        .collect();

    if pairs.is_empty() {
        tracing::info!("Recipe {} has no ingredients; nutrition left unset", recipe_id);
        return Ok(RecipeNutrition {
            recipe_id,
            nutrition: Nutrition::zero(),
            computed_now: false,
            computed_at: None,
        });
    }

    let nutrition = engine.recipe_totals(&pairs).rounded();
    let computed_at = chrono::Utc::now().to_rfc3339();

    if Recipe::store_nutrition_once(conn, recipe_id, &nutrition, &computed_at)? {
        tracing::info!(
            "Computed nutrition for recipe {} from {} ingredients: {:.2} kcal",
            recipe_id,
            pairs.len(),
            nutrition.calories
        );
        return Ok(RecipeNutrition {
            recipe_id,
            nutrition,
            computed_now: true,
            computed_at: Some(computed_at),
        });
    }

    // Lost a race with another writer: report what was stored
    let stored = Recipe::get_by_id(conn, recipe_id)?.ok_or(DbError::NotFound("Recipe", recipe_id))?;
    Ok(RecipeNutrition {
        recipe_id,
        nutrition: stored.nutrition.unwrap_or(nutrition),
        computed_now: false,
        computed_at: stored.nutrition_computed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::RecipeCreate;
    use crate::nutrition::reference::tests::sample_table;
    use crate::nutrition::{EngineSettings, UnitConversionTable};

    fn setup() -> (Connection, NutritionEngine) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let engine = NutritionEngine::new(
            sample_table(),
            UnitConversionTable::standard(),
            EngineSettings::default(),
        );
        (conn, engine)
    }

    fn create_recipe(conn: &Connection, title: &str) -> i64 {
        Recipe::create(conn, &RecipeCreate { title: title.to_string() }).unwrap().id
    }

    #[test]
    fn test_append_keeps_positions() {
        let (conn, _) = setup();
        let id = create_recipe(&conn, "Trứng rán");
        RecipeIngredient::append(&conn, id, &[IngredientQuantity::new("trứng gà", "2 quả")]).unwrap();
        RecipeIngredient::append(
            &conn,
            id,
            &[
                IngredientQuantity::new("muối", "1 nhúm"),
                IngredientQuantity { name: "hành lá".into(), quantity: None },
            ],
        )
        .unwrap();

        let lines = RecipeIngredient::get_for_recipe(&conn, id).unwrap();
        let positions: Vec<i64> = lines.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(lines[2].quantity, None);
        assert_eq!(RecipeIngredient::count_for_recipe(&conn, id).unwrap(), 3);
    }

    #[test]
    fn test_nutrition_is_computed_once() {
        let (conn, engine) = setup();
        let id = create_recipe(&conn, "Trứng luộc");
        RecipeIngredient::append(&conn, id, &[IngredientQuantity::new("trứng gà", "2 quả")]).unwrap();

        let first = resolve_recipe_nutrition(&conn, &engine, id).unwrap();
        assert!(first.computed_now);
        assert_eq!(first.nutrition.calories, 166.0);
        assert_eq!(first.nutrition.protein, 14.8);

        // New ingredients do not change the stored value
        RecipeIngredient::append(&conn, id, &[IngredientQuantity::new("gạo tẻ", "1 kg")]).unwrap();
        let second = resolve_recipe_nutrition(&conn, &engine, id).unwrap();
        assert!(!second.computed_now);
        assert_eq!(second.nutrition, first.nutrition);
        assert_eq!(second.computed_at, first.computed_at);
    }

    #[test]
    fn test_calibration_applied_before_storing() {
        let (conn, engine) = setup();
        let id = create_recipe(&conn, "Cơm");
        RecipeIngredient::append(&conn, id, &[IngredientQuantity::new("gạo tẻ", "1 kg")]).unwrap();

        let result = resolve_recipe_nutrition(&conn, &engine, id).unwrap();
        // 3440 kcal raw -> 800 + 2940 * 700 / 2500
        assert_eq!(result.nutrition.calories, 1623.2);
        assert_eq!(result.nutrition.protein, 79.0);
    }

    #[test]
    fn test_empty_recipe_is_not_stored() {
        let (conn, engine) = setup();
        let id = create_recipe(&conn, "Trống");

        let empty = resolve_recipe_nutrition(&conn, &engine, id).unwrap();
        assert!(empty.nutrition.is_zero());
        assert!(!empty.computed_now);
        assert!(Recipe::get_by_id(&conn, id).unwrap().unwrap().nutrition.is_none());

        RecipeIngredient::append(&conn, id, &[IngredientQuantity::new("muối", "1 nhúm")]).unwrap();
        assert!(resolve_recipe_nutrition(&conn, &engine, id).unwrap().computed_now);
    }

    #[test]
    fn test_missing_recipe() {
        let (conn, engine) = setup();
        assert!(matches!(
            resolve_recipe_nutrition(&conn, &engine, 42),
            Err(DbError::NotFound("Recipe", 42))
        ));
    }

    #[test]
    fn test_store_nutrition_once_refuses_overwrite() {
        let (conn, _) = setup();
        let id = create_recipe(&conn, "Canh");
        let a = Nutrition::new(1.0, 2.0, 3.0, 4.0);
        assert!(Recipe::store_nutrition_once(&conn, id, &a, "t1").unwrap());
        assert!(!Recipe::store_nutrition_once(&conn, id, &Nutrition::zero(), "t2").unwrap());
        assert_eq!(Recipe::get_by_id(&conn, id).unwrap().unwrap().nutrition, Some(a));
    }

    #[test]
    fn test_delete_cascades() {
        let (conn, _) = setup();
        let id = create_recipe(&conn, "Xoá");
        RecipeIngredient::append(&conn, id, &[IngredientQuantity::new("muối", "1 nhúm")]).unwrap();
        assert!(Recipe::delete(&conn, id).unwrap());
        assert_eq!(RecipeIngredient::count_for_recipe(&conn, id).unwrap(), 0);
        assert!(!Recipe::delete(&conn, id).unwrap());
    }
}
