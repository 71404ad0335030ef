//! Data models
//!
//! Rust structs for the recipe store and the shared macro vector.

mod nutrition;
mod recipe;
mod recipe_ingredient;

pub use nutrition::Nutrition;
pub use recipe::{Recipe, RecipeCreate};
pub use recipe_ingredient::{resolve_recipe_nutrition, RecipeIngredient, RecipeNutrition};
