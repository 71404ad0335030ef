//! String similarity metrics
//!
//! Four approximate-match scores over a pair of strings, each in `[0, 100]`.
//! Inputs are compared as given: callers lowercase before scoring.

use std::collections::BTreeSet;

use serde::Serialize;

/// The metrics evaluated for every ingredient candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ratio,
    PartialRatio,
    TokenSortRatio,
    TokenSetRatio,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Ratio,
        Metric::PartialRatio,
        Metric::TokenSortRatio,
        Metric::TokenSetRatio,
    ];

    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Metric::Ratio => ratio(a, b),
            Metric::PartialRatio => partial_ratio(a, b),
            Metric::TokenSortRatio => token_sort_ratio(a, b),
            Metric::TokenSetRatio => token_set_ratio(a, b),
        }
    }
}

/// Evaluate all four metrics, in [`Metric::ALL`] order
pub fn score_all(a: &str, b: &str) -> [f64; 4] {
    Metric::ALL.map(|metric| metric.score(a, b))
}

/// Length of the longest common subsequence
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Single rolling row over the shorter side
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; inner.len() + 1];

    for &oc in outer {
        let mut diagonal = 0;
        for (j, &ic) in inner.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if oc == ic {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[inner.len()]
}

/// Insertion/deletion edit distance: a substitution costs one of each
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_distance_chars(&a, &b)
}

fn indel_distance_chars(a: &[char], b: &[char]) -> usize {
    a.len() + b.len() - 2 * lcs_len(a, b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let distance = indel_distance_chars(a, b);
    100.0 * (total - distance) as f64 / total as f64
}

/// Normalized edit similarity: `100 * (|a| + |b| - d) / (|a| + |b|)`
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against every same-length window of the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Exactly one side without tokens scores 0, both empty scores 100
fn empty_token_score(a_empty: bool, b_empty: bool) -> Option<f64> {
    match (a_empty, b_empty) {
        (true, true) => Some(100.0),
        (true, false) | (false, true) => Some(0.0),
        (false, false) => None,
    }
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// [`ratio`] after sorting whitespace tokens
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    if let Some(score) = empty_token_score(a.is_empty(), b.is_empty()) {
        return score;
    }
    ratio(&a, &b)
}

fn join_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}

fn concat_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{} {}", head, tail),
    }
}

/// Set-based token comparison.
///
/// Shared tokens form the intersection; each side's leftovers are appended to it
/// (all sorted). The score is the best [`ratio`] among intersection vs. each
/// combined string and the two combined strings against each other.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();
    if let Some(score) = empty_token_score(a_tokens.is_empty(), b_tokens.is_empty()) {
        return score;
    }

    let intersection = join_tokens(a_tokens.intersection(&b_tokens).copied());
    let a_only = join_tokens(a_tokens.difference(&b_tokens).copied());
    let b_only = join_tokens(b_tokens.difference(&a_tokens).copied());

    let combined_a = concat_nonempty(&intersection, &a_only);
    let combined_b = concat_nonempty(&intersection, &b_only);

    ratio(&intersection, &combined_a)
        .max(ratio(&intersection, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: &[(&str, &str)] = &[
        ("trứng gà", "trứng vịt"),
        ("thịt bò", "bò thịt"),
        ("hành lá", "lá hành tươi"),
        ("muối", "muối i-ốt"),
        ("", "gạo"),
        ("abc", "xyz"),
        ("nước mắm", "nước"),
    ];

    #[test]
    fn test_ratio_identity() {
        for s in ["", "a", "gạo tẻ", "muỗng canh"] {
            assert_eq!(ratio(s, s), 100.0);
        }
    }

    #[test]
    fn test_ratio_known_values() {
        // lcs("abcd", "abce") = 3 -> distance 2 -> 100 * 6 / 8
        assert!((ratio("abcd", "abce") - 75.0).abs() < 1e-9);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_ratio_counts_chars_not_bytes() {
        // "gà" vs "ga": one differing char out of two on each side
        assert!((ratio("gà", "ga") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_indel_distance() {
        assert_eq!(indel_distance("kitten", "sitting"), 5);
        assert_eq!(indel_distance("", "abc"), 3);
        assert_eq!(indel_distance("same", "same"), 0);
    }

    #[test]
    fn test_partial_ratio_substring_is_perfect() {
        assert_eq!(partial_ratio("muối", "muối biển"), 100.0);
        assert_eq!(partial_ratio("hành", "củ hành tím"), 100.0);
    }

    #[test]
    fn test_partial_ratio_empty() {
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_token_sort_ignores_order() {
        assert_eq!(token_sort_ratio("thịt bò", "bò thịt"), 100.0);
        assert_eq!(token_sort_ratio("a  b", "b a"), 100.0);
    }

    #[test]
    fn test_token_set_subset_is_perfect() {
        assert_eq!(token_set_ratio("hành lá", "lá hành tươi"), 100.0);
        assert_eq!(token_set_ratio("", ""), 100.0);
        assert_eq!(token_set_ratio("", "gạo"), 0.0);
    }

    #[test]
    fn test_token_set_disjoint() {
        // no intersection: only combined_a vs combined_b contributes
        assert_eq!(token_set_ratio("abc", "xyz"), ratio("abc", "xyz"));
    }

    #[test]
    fn test_metrics_are_symmetric() {
        for (a, b) in PAIRS {
            for metric in Metric::ALL {
                assert_eq!(
                    metric.score(a, b),
                    metric.score(b, a),
                    "{:?} not symmetric for {:?}/{:?}",
                    metric,
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_scores_in_range() {
        for (a, b) in PAIRS {
            for score in score_all(a, b) {
                assert!((0.0..=100.0).contains(&score));
            }
        }
    }
}
