//! nutriresolve
//!
//! An MCP server that resolves ingredient lists to macro-nutrient totals.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutriresolve::build_info;
use nutriresolve::config::Config;
use nutriresolve::db;
use nutriresolve::mcp::NutritionService;
use nutriresolve::nutrition::NutritionEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging goes to stderr so it does not interfere with MCP stdio
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriresolve=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    eprintln!("Reference data: {}", config.reference_path.display());
    eprintln!("Database path: {}", config.database_path.display());

    // A missing or malformed dataset is fatal
    let engine = NutritionEngine::load(&config.reference_path, config.settings)?;
    build_info::print_startup_banner(&engine);

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&config.database_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    eprintln!("Starting MCP server on stdio...");
    let service = NutritionService::new(&config, database, engine);

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
