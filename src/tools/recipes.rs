//! Recipe MCP Tools
//!
//! Tools for managing recipes, their ingredient lines, and stored nutrition.

use serde::Serialize;

use crate::db::{Database, DbError};
use crate::models::{
    resolve_recipe_nutrition, Nutrition, Recipe, RecipeCreate, RecipeIngredient, RecipeNutrition,
};
use crate::nutrition::{IngredientQuantity, NutritionEngine};

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub title: String,
    pub ingredient_count: usize,
    pub created_at: String,
}

/// Full recipe detail with ingredient lines
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<RecipeIngredient>,
    /// `None` until nutrition has been requested once
    pub nutrition: Option<Nutrition>,
    pub nutrition_computed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub calories: Option<f64>,
    pub ingredient_count: i64,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for add_recipe_ingredients
#[derive(Debug, Serialize)]
pub struct AddIngredientsResponse {
    pub recipe_id: i64,
    pub added: Vec<RecipeIngredient>,
    pub ingredient_count: i64,
    /// Stored nutrition is not recomputed after new lines are added
    pub nutrition_locked: bool,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_ingredients(ingredients: &[IngredientQuantity]) -> Result<(), String> {
    for (i, ingredient) in ingredients.iter().enumerate() {
        if ingredient.name.trim().is_empty() {
            return Err(format!("Ingredient {} has an empty name", i + 1));
        }
    }
    Ok(())
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe, optionally with its first ingredient lines
pub fn create_recipe(
    db: &Database,
    title: &str,
    ingredients: &[IngredientQuantity],
) -> Result<CreateRecipeResponse, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Recipe title cannot be empty".to_string());
    }
    validate_ingredients(ingredients)?;

    let (recipe, added) = db
        .with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let recipe = Recipe::create(&tx, &RecipeCreate { title: title.to_string() })?;
            let added = RecipeIngredient::append(&tx, recipe.id, ingredients)?;
            tx.commit()?;
            Ok((recipe, added))
        })
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    tracing::info!("Created recipe {} '{}' with {} ingredients", recipe.id, recipe.title, added.len());

    Ok(CreateRecipeResponse {
        id: recipe.id,
        title: recipe.title,
        ingredient_count: added.len(),
        created_at: recipe.created_at,
    })
}

/// Append ingredient lines to an existing recipe
pub fn add_recipe_ingredients(
    db: &Database,
    recipe_id: i64,
    ingredients: &[IngredientQuantity],
) -> Result<AddIngredientsResponse, String> {
    if ingredients.is_empty() {
        return Err("No ingredients provided".to_string());
    }
    validate_ingredients(ingredients)?;

    let recipe = db
        .with_conn(|conn| Recipe::get_by_id(conn, recipe_id))
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", recipe_id))?;

    let (added, ingredient_count) = db
        .with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let added = RecipeIngredient::append(&tx, recipe_id, ingredients)?;
            Recipe::touch(&tx, recipe_id)?;
            let count = RecipeIngredient::count_for_recipe(&tx, recipe_id)?;
            tx.commit()?;
            Ok((added, count))
        })
        .map_err(|e| format!("Failed to add ingredients: {}", e))?;

    Ok(AddIngredientsResponse {
        recipe_id,
        added,
        ingredient_count,
        nutrition_locked: recipe.nutrition.is_some(),
    })
}

/// Get a recipe with its ingredient lines
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?;

    match recipe {
        Some(recipe) => {
            let ingredients = RecipeIngredient::get_for_recipe(&conn, id)
                .map_err(|e| format!("Failed to get ingredients: {}", e))?;

            Ok(Some(RecipeDetail {
                id: recipe.id,
                title: recipe.title,
                ingredients,
                nutrition: recipe.nutrition,
                nutrition_computed_at: recipe.nutrition_computed_at,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
            }))
        }
        None => Ok(None),
    }
}

/// List recipes with optional title search and pagination
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn, query)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let ingredient_count = RecipeIngredient::count_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to count ingredients: {}", e))?;

        summaries.push(RecipeSummary {
            id: recipe.id,
            title: recipe.title,
            calories: recipe.nutrition.map(|n| n.calories),
            ingredient_count,
        });
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
        limit,
        offset,
    })
}

/// Delete a recipe and its ingredient lines
pub fn delete_recipe(db: &Database, id: i64) -> Result<RecipeDeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Recipe::delete(&conn, id).map_err(|e| format!("Failed to delete recipe: {}", e))?;
    if !deleted {
        return Err(format!("Recipe not found with id: {}", id));
    }

    Ok(RecipeDeleteResponse {
        success: true,
        deleted_id: id,
    })
}

/// Stored nutrition for a recipe, computed on first request
pub fn get_recipe_nutrition(
    db: &Database,
    engine: &NutritionEngine,
    id: i64,
) -> Result<RecipeNutrition, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    resolve_recipe_nutrition(&conn, engine, id).map_err(|e| match e {
        DbError::NotFound(_, id) => format!("Recipe not found with id: {}", id),
        other => format!("Failed to resolve nutrition: {}", other),
    })
}
