//! Ingredient matching
//!
//! Finds the reference row whose alias best matches a freeform ingredient name.

use serde::Serialize;

use super::reference::NutritionTable;
use super::similarity::score_all;
use crate::models::Nutrition;

/// Scores must exceed this to be trusted
pub const ACCEPTANCE_THRESHOLD: f64 = 80.0;

/// Outcome of an ingredient lookup. Unmatched names carry zero nutrition.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Matched canonical key
    pub key: Option<String>,
    /// The alias part of the key that produced the best score
    pub alias: Option<String>,
    /// Best max-of-four score seen, whether or not it was accepted
    pub score: f64,
    /// Values per 100 g
    pub nutrition: Nutrition,
}

impl MatchResult {
    fn unmatched(score: f64) -> Self {
        Self {
            key: None,
            alias: None,
            score,
            nutrition: Nutrition::zero(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.key.is_some()
    }
}

struct Candidate<'a> {
    record: usize,
    alias: &'a str,
    max_score: f64,
    mean_score: f64,
}

/// Match `raw_name` against every alias of every reference row.
///
/// Each alias is scored with all four similarity metrics. The running best is replaced
/// when its max score is beaten, or tied with a higher mean score; earlier rows win
/// exact ties. The best candidate is accepted only if its max score is above
/// [`ACCEPTANCE_THRESHOLD`].
pub fn match_ingredient(raw_name: &str, table: &NutritionTable) -> MatchResult {
    if raw_name.trim().is_empty() {
        return MatchResult::unmatched(0.0);
    }
    let name = raw_name.to_lowercase();

    let mut best: Option<Candidate> = None;

    for (idx, record) in table.records().iter().enumerate() {
        for alias in &record.aliases {
            let scores = score_all(&name, alias);
            let max_score = scores.iter().copied().fold(0.0, f64::max);
            let mean_score = scores.iter().sum::<f64>() / scores.len() as f64;

            let (best_max, best_mean) = best
                .as_ref()
                .map_or((0.0, 0.0), |b| (b.max_score, b.mean_score));

            if max_score > best_max || (max_score == best_max && mean_score > best_mean) {
                best = Some(Candidate {
                    record: idx,
                    alias,
                    max_score,
                    mean_score,
                });
            }
        }
    }

    match best {
        Some(candidate) if candidate.max_score > ACCEPTANCE_THRESHOLD => {
            let record = &table.records()[candidate.record];
            tracing::debug!(
                "Matched '{}' to '{}' via '{}' (max {:.1}, mean {:.1})",
                raw_name,
                record.key,
                candidate.alias,
                candidate.max_score,
                candidate.mean_score
            );
            MatchResult {
                key: Some(record.key.clone()),
                alias: Some(candidate.alias.to_string()),
                score: candidate.max_score,
                nutrition: record.nutrition,
            }
        }
        Some(candidate) => {
            tracing::debug!(
                "No reference match for '{}' (best '{}' at {:.1})",
                raw_name,
                candidate.alias,
                candidate.max_score
            );
            MatchResult::unmatched(candidate.max_score)
        }
        None => {
            tracing::debug!("No reference match for '{}'", raw_name);
            MatchResult::unmatched(0.0)
        }
    }
}
