//! Per-meal calorie targets
//!
//! Rough energy need from body weight and activity, used to pick recipes
//! whose calibrated energy fits one meal.

use serde::{Deserialize, Serialize};

/// Share of the daily need assigned to one meal
pub const MEAL_SHARE: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Anything other than "male" is treated as female
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("male") {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    fn factor(&self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Low,
    #[default]
    Moderate,
    Heavy,
}

impl ActivityLevel {
    /// Unknown levels fall back to moderate
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "low" => ActivityLevel::Low,
            "heavy" => ActivityLevel::Heavy,
            _ => ActivityLevel::Moderate,
        }
    }

    fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 0.2,
            ActivityLevel::Low => 0.3,
            ActivityLevel::Moderate => 0.4,
            ActivityLevel::Heavy => 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalorieNeeds {
    pub basal: f64,
    pub daily: f64,
    pub per_meal: f64,
}

/// Basal need is `sex_factor * weight_kg * 24`; thermic effect adds 10% and
/// activity its factor on top.
pub fn estimate_calorie_needs(sex: Sex, weight_kg: f64, activity: ActivityLevel) -> CalorieNeeds {
    let basal = sex.factor() * weight_kg * 24.0;
    let daily = basal + 0.1 * basal + activity.factor() * basal;
    CalorieNeeds {
        basal,
        daily,
        per_meal: daily * MEAL_SHARE,
    }
}
