//! Tools module
//!
//! MCP tool implementations for the nutrition service.

pub mod nutrition;
pub mod recipes;
pub mod status;
