//! Build and startup identity
//!
//! `build.rs` stamps every compile with a build number and timestamp. They surface
//! in the startup banner, the `nutrition_status` tool and the MCP server info.

use serde::Serialize;

use crate::nutrition::{CalibrationPolicy, NutritionEngine};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Human-readable server title advertised over MCP
pub const SERVER_TITLE: &str = "Ingredient Nutrition Engine";

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("NUTRIRESOLVE_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Build number, incremented on each recompilation. 0 when built without `build.rs`.
pub fn build_number() -> u64 {
    option_env!("NUTRIRESOLVE_BUILD_NUMBER")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: build_number(),
            build_timestamp: BUILD_TIMESTAMP,
            description: DESCRIPTION,
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// What the loaded engine holds, as shown at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSummary {
    pub reference_records: usize,
    pub unit_count: usize,
    pub policy: CalibrationPolicy,
}

impl EngineSummary {
    pub fn of(engine: &NutritionEngine) -> Self {
        Self {
            reference_records: engine.reference().len(),
            unit_count: engine.units().len(),
            policy: engine.settings().policy,
        }
    }
}

fn policy_label(policy: CalibrationPolicy) -> &'static str {
    match policy {
        CalibrationPolicy::EnergyOnly => "energy only",
        CalibrationPolicy::AllMacros => "all macros",
    }
}

/// Banner lines for a loaded engine
pub fn startup_banner(info: &BuildInfo, summary: &EngineSummary) -> String {
    let rule = "=".repeat(47);
    format!(
        "{rule}\n  {} - {}\n  Version: {} | Build: {}\n  Compiled: {}\n  Reference: {} ingredients | Units: {}\n  Calibration: {}\n{rule}",
        info.name,
        SERVER_TITLE.to_lowercase(),
        info.version,
        info.build_number,
        info.build_timestamp,
        summary.reference_records,
        summary.unit_count,
        policy_label(summary.policy),
    )
}

/// Print the startup banner to stderr once the engine is loaded
pub fn print_startup_banner(engine: &NutritionEngine) {
    eprintln!("{}", startup_banner(&BuildInfo::current(), &EngineSummary::of(engine)));
}
