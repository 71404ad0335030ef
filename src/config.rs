//! Runtime configuration
//!
//! Read once from the environment at startup.

use std::path::PathBuf;

use thiserror::Error;

use crate::nutrition::{
    CalibrationParams, CalibrationPolicy, EngineSettings, UnmatchedUnitFallback,
    UNMATCHED_UNIT_MASS_FRACTION,
};

pub const REFERENCE_PATH_VAR: &str = "NUTRIRESOLVE_REFERENCE_PATH";
pub const DATABASE_PATH_VAR: &str = "NUTRIRESOLVE_DATABASE_PATH";
pub const CALIBRATION_VAR: &str = "NUTRIRESOLVE_CALIBRATION";
pub const CALIBRATION_CLAMP_VAR: &str = "NUTRIRESOLVE_CALIBRATION_CLAMP";
pub const UNMATCHED_UNIT_VAR: &str = "NUTRIRESOLVE_UNMATCHED_UNIT";
pub const UNMATCHED_UNIT_FRACTION_VAR: &str = "NUTRIRESOLVE_UNMATCHED_UNIT_FRACTION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: expected {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub reference_path: PathBuf,
    pub database_path: PathBuf,
    pub settings: EngineSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reference_path = lookup(REFERENCE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("nutrition_reference.csv"));
        let database_path = lookup(DATABASE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("nutriresolve.db"));

        let policy = match lookup(CALIBRATION_VAR) {
            Some(v) => v.parse::<CalibrationPolicy>().map_err(|_| ConfigError::InvalidValue {
                var: CALIBRATION_VAR,
                value: v.clone(),
                expected: "'energy' or 'all'",
            })?,
            None => CalibrationPolicy::default(),
        };

        let clamp = match lookup(CALIBRATION_CLAMP_VAR) {
            Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue {
                var: CALIBRATION_CLAMP_VAR,
                value: v,
                expected: "true or false",
            })?,
            None => false,
        };

        let fraction = match lookup(UNMATCHED_UNIT_FRACTION_VAR) {
            Some(v) => match v.trim().parse::<f64>() {
                Ok(f) if f.is_finite() && f >= 0.0 => f,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: UNMATCHED_UNIT_FRACTION_VAR,
                        value: v,
                        expected: "a non-negative number",
                    })
                }
            },
            None => UNMATCHED_UNIT_MASS_FRACTION,
        };

        let unmatched_unit = match lookup(UNMATCHED_UNIT_VAR).as_deref().map(str::trim) {
            None | Some("fixed") => UnmatchedUnitFallback::Fixed(fraction),
            Some("per_amount") => UnmatchedUnitFallback::PerAmount(fraction),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: UNMATCHED_UNIT_VAR,
                    value: other.to_string(),
                    expected: "'fixed' or 'per_amount'",
                })
            }
        };

        Ok(Self {
            reference_path,
            database_path,
            settings: EngineSettings {
                calibration: CalibrationParams {
                    clamp,
                    ..CalibrationParams::default()
                },
                policy,
                unmatched_unit,
            },
        })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `<project>/data`, found by walking up from target/release or target/debug
pub fn data_dir() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path
}
