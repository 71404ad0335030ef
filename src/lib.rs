//! Ingredient nutrition engine
//!
//! Resolves freeform ingredient lines to macro-nutrient totals against a
//! per-100g reference dataset, and stores recipes whose nutrition is computed once.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
