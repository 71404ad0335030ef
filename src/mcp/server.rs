//! MCP Server Implementation
//!
//! Exposes the nutrition engine and the recipe store as MCP tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::nutrition::{IngredientQuantity, NutritionEngine};
use crate::tools::nutrition;
use crate::tools::recipes;
use crate::tools::status::StatusTracker;

/// Nutrition MCP Service
#[derive(Clone)]
pub struct NutritionService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    engine: NutritionEngine,
    tool_router: ToolRouter<NutritionService>,
}

impl NutritionService {
    pub fn new(config: &Config, database: Database, engine: NutritionEngine) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(
                config.reference_path.clone(),
                config.database_path.clone(),
            ))),
            database,
            engine,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Nutrition Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MatchIngredientParams {
    /// Freeform ingredient name, e.g. "Trứng gà"
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QuantityParams {
    /// Quantity text such as "2 muỗng canh" or "200g". Omit for no quantity.
    pub quantity: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParam {
    /// Ingredient name
    pub name: String,
    /// Quantity text, may be omitted
    pub quantity: Option<String>,
}

impl From<IngredientParam> for IngredientQuantity {
    fn from(p: IngredientParam) -> Self {
        IngredientQuantity {
            name: p.name,
            quantity: p.quantity,
        }
    }
}

fn to_ingredients(params: Vec<IngredientParam>) -> Vec<IngredientQuantity> {
    params.into_iter().map(IngredientQuantity::from).collect()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateNutritionParams {
    /// Ingredient lines to resolve and sum
    pub ingredients: Vec<IngredientParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EstimateMealCaloriesParams {
    /// "male" or "female"
    pub sex: String,
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// sedentary, low, moderate (default) or heavy
    pub activity: Option<String>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Recipe title
    pub title: String,
    /// Initial ingredient lines (optional)
    #[serde(default)]
    pub ingredients: Vec<IngredientParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientsParams {
    /// Recipe ID to add ingredients to
    pub recipe_id: i64,
    /// Ingredient lines appended after the existing ones
    pub ingredients: Vec<IngredientParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Title substring filter
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutritionService {
    // --- Status ---

    #[tool(description = "Get the current status of the nutrition service including build info, reference dataset size, engine settings, database status, and process information")]
    async fn nutrition_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.engine);
        to_json(&status)
    }

    // --- Nutrition ---

    #[tool(description = "Fuzzy-match an ingredient name against the nutrition reference dataset. Returns the matched key, the best score and per-100g macros (zero when the score is not above 80).")]
    fn match_ingredient(&self, Parameters(p): Parameters<MatchIngredientParams>) -> Result<CallToolResult, McpError> {
        to_json(&nutrition::match_ingredient(&self.engine, &p.name))
    }

    #[tool(description = "Split quantity text into an amount and a unit token. Bare numbers are grams; unparsable text is 0 g.")]
    fn parse_quantity(&self, Parameters(p): Parameters<QuantityParams>) -> Result<CallToolResult, McpError> {
        to_json(&nutrition::parse_quantity(&self.engine, p.quantity.as_deref()))
    }

    #[tool(description = "Convert quantity text into a mass fraction (grams / 100) using the household unit table")]
    fn normalize_quantity(&self, Parameters(p): Parameters<QuantityParams>) -> Result<CallToolResult, McpError> {
        to_json(&nutrition::normalize_quantity(&self.engine, p.quantity.as_deref()))
    }

    #[tool(description = "Resolve a list of ingredient lines. Returns a per-ingredient breakdown, the raw macro total and the calibrated total.")]
    fn calculate_nutrition(&self, Parameters(p): Parameters<CalculateNutritionParams>) -> Result<CallToolResult, McpError> {
        let ingredients = to_ingredients(p.ingredients);
        to_json(&nutrition::calculate_nutrition(&self.engine, &ingredients))
    }

    #[tool(description = "Estimate daily and per-meal calorie targets from sex, body weight and activity level")]
    fn estimate_meal_calories(&self, Parameters(p): Parameters<EstimateMealCaloriesParams>) -> Result<CallToolResult, McpError> {
        let result = nutrition::estimate_meal_calories(&p.sex, p.weight_kg, p.activity.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe with an optional list of ingredient lines")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let ingredients = to_ingredients(p.ingredients);
        let result = recipes::create_recipe(&self.database, &p.title, &ingredients)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Append ingredient lines to a recipe. Nutrition already stored for the recipe is not recomputed.")]
    fn add_recipe_ingredients(&self, Parameters(p): Parameters<AddRecipeIngredientsParams>) -> Result<CallToolResult, McpError> {
        let ingredients = to_ingredients(p.ingredients);
        let result = recipes::add_recipe_ingredients(&self.database, p.recipe_id, &ingredients)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a recipe with its ingredient lines and stored nutrition, if any")]
    fn get_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(recipe) => serde_json::to_string_pretty(&recipe),
            None => Ok(format!(r#"{{"error": "Recipe not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List recipes with optional title search and pagination")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a recipe and its ingredient lines")]
    fn delete_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get the calibrated nutrition of a recipe. Computed from its ingredients on the first request, then stored and returned unchanged.")]
    fn get_recipe_nutrition(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe_nutrition(&self.database, &self.engine, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutritionService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriresolve".into(),
                version: crate::build_info::VERSION.into(),
                title: Some(crate::build_info::SERVER_TITLE.into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ingredient nutrition engine for Vietnamese recipes. Values are per 100 g in the reference dataset. \
                 Lookups: match_ingredient, parse_quantity, normalize_quantity, calculate_nutrition, estimate_meal_calories. \
                 Recipes: create_recipe, add_recipe_ingredients, get_recipe, list_recipes, delete_recipe. \
                 get_recipe_nutrition computes a recipe's calibrated totals once and returns the stored values afterwards. \
                 Status: nutrition_status."
                    .into(),
            ),
        }
    }
}
