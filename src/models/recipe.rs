//! Recipe model
//!
//! A titled recipe with its once-computed nutrition totals.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::Nutrition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    /// Calibrated totals, `None` until first computed
    pub nutrition: Option<Nutrition>,
    pub nutrition_computed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub title: String,
}

impl Recipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let calories: Option<f64> = row.get("calories")?;
        let protein: Option<f64> = row.get("protein")?;
        let fat: Option<f64> = row.get("fat")?;
        let carbs: Option<f64> = row.get("carbs")?;

        // All four or nothing
        let nutrition = match (calories, protein, fat, carbs) {
            (Some(c), Some(p), Some(f), Some(cb)) => Some(Nutrition::new(c, p, f, cb)),
            _ => None,
        };

        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            nutrition,
            nutrition_computed_at: row.get("nutrition_computed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute("INSERT INTO recipes (title) VALUES (?1)", params![data.title])?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Recipe", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes, optionally filtered by a title substring
    pub fn list(conn: &Connection, query: Option<&str>, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let recipes = match query {
            Some(q) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM recipes WHERE title LIKE ?1 ORDER BY title ASC LIMIT ?2 OFFSET ?3",
                )?;
                let pattern = format!("%{}%", q);
                let recipes = stmt
                    .query_map(params![pattern, limit, offset], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                recipes
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM recipes ORDER BY title ASC LIMIT ?1 OFFSET ?2")?;
                let recipes = stmt
                    .query_map(params![limit, offset], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                recipes
            }
        };
        Ok(recipes)
    }

    pub fn count(conn: &Connection, query: Option<&str>) -> DbResult<i64> {
        let count = match query {
            Some(q) => conn.query_row(
                "SELECT COUNT(*) FROM recipes WHERE title LIKE ?1",
                [format!("%{}%", q)],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Delete a recipe and its ingredients
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Persist nutrition only if none is stored yet.
    ///
    /// Returns false when another writer got there first; stored values are never replaced.
    pub fn store_nutrition_once(
        conn: &Connection,
        id: i64,
        nutrition: &Nutrition,
        computed_at: &str,
    ) -> DbResult<bool> {
        let rows = conn.execute(
            r#"
            UPDATE recipes
            SET calories = ?1, protein = ?2, fat = ?3, carbs = ?4,
                nutrition_computed_at = ?5, updated_at = datetime('now')
            WHERE id = ?6 AND calories IS NULL
            "#,
            params![
                nutrition.calories,
                nutrition.protein,
                nutrition.fat,
                nutrition.carbs,
                computed_at,
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn touch(conn: &Connection, id: i64) -> DbResult<()> {
        conn.execute(
            "UPDATE recipes SET updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }
}
