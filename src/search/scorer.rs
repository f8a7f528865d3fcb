//! Similarity scorers on a 0-100 scale.
//!
//! All scorers normalize both sides first: lowercase, every non-alphanumeric
//! character becomes a space, surrounding whitespace trimmed. Strings that only
//! become equal through that normalization (`api.v1.User` and `api_v1.User`)
//! score 99, so 100 stays reserved for matches that differ at most in case.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub trait Scorer: Send + Sync {
    /// Similarity of `candidate` to `query`, 0 (unrelated) to 100 (identical)
    fn score(&self, query: &str, candidate: &str) -> u32;
}

/// Selects a scorer from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    Weighted,
    Partial,
    Plain,
}

impl ScorerKind {
    pub fn scorer(self) -> Arc<dyn Scorer> {
        match self {
            Self::Weighted => Arc::new(WeightedRatio),
            Self::Partial => Arc::new(PartialRatio),
            Self::Plain => Arc::new(PlainRatio),
        }
    }
}

/// Edit-distance similarity of the whole strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRatio;

/// Best match of the shorter string against every same-length window of the
/// longer one. Good for finding a word inside a sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

/// Blend of plain, token-order-insensitive and partial comparisons, picking
/// the strategy from the length ratio of the two strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRatio;

impl Scorer for PlainRatio {
    fn score(&self, query: &str, candidate: &str) -> u32 {
        let (a, b) = (normalize(query), normalize(candidate));
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        capped(query, candidate, &a, &b, ratio(&a, &b))
    }
}

impl Scorer for PartialRatio {
    fn score(&self, query: &str, candidate: &str) -> u32 {
        let (a, b) = (normalize(query), normalize(candidate));
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        capped(query, candidate, &a, &b, partial_ratio(&a, &b))
    }
}

const UNBASE_SCALE: f64 = 0.95;

impl Scorer for WeightedRatio {
    fn score(&self, query: &str, candidate: &str) -> u32 {
        let (a, b) = (normalize(query), normalize(candidate));
        if a.is_empty() || b.is_empty() {
            return 0;
        }

        let (len_a, len_b) = (a.chars().count() as f64, b.chars().count() as f64);
        let len_ratio = len_a.max(len_b) / len_a.min(len_b);
        let base = ratio(&a, &b);

        if len_ratio < 1.5 {
            let sorted = ratio(&token_sort(&a), &token_sort(&b)) * UNBASE_SCALE;
            let set = token_set_ratio(&a, &b, ratio) * UNBASE_SCALE;
            return capped(query, candidate, &a, &b, base.max(sorted).max(set));
        }

        let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        let partial = partial_ratio(&a, &b) * partial_scale;
        let partial_sorted =
            partial_ratio(&token_sort(&a), &token_sort(&b)) * UNBASE_SCALE * partial_scale;
        let partial_set = token_set_ratio(&a, &b, partial_ratio) * UNBASE_SCALE * partial_scale;

        let best = base.max(partial).max(partial_sorted).max(partial_set);
        capped(query, candidate, &a, &b, best)
    }
}

fn normalize(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    replaced.trim().to_string()
}

fn to_score(similarity: f64) -> u32 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u32
}

/// `to_score`, except normalized-equal strings whose raw text differs beyond
/// case top out at 99.
fn capped(query: &str, candidate: &str, a: &str, b: &str, similarity: f64) -> u32 {
    let score = to_score(similarity);
    if score == 100 && a == b && !query.trim().eq_ignore_ascii_case(candidate.trim()) {
        return 99;
    }
    score
}

/// 0.0..=1.0
fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

fn partial_ratio(a: &str, b: &str) -> f64 {
    let (a_chars, b_chars): (Vec<char>, Vec<char>) = (a.chars().collect(), b.chars().collect());
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };
    if short.is_empty() {
        return 0.0;
    }

    let needle: String = short.iter().collect();
    let mut best: f64 = 0.0;
    for window in long.windows(short.len()) {
        let window: String = window.iter().collect();
        best = best.max(ratio(&needle, &window));
        if best >= 1.0 {
            break;
        }
    }
    best
}

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

fn token_sort(s: &str) -> String {
    let mut words: Vec<&str> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// Compare the shared tokens against each side's full token set. A side whose
/// tokens are all shared counts as a full match.
fn token_set_ratio(a: &str, b: &str, compare: fn(&str, &str) -> f64) -> f64 {
    let (set_a, set_b) = (tokens(a), tokens(b));
    let shared: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 1.0;
    }

    let shared_joined = shared.join(" ");
    let combine = |rest: &[&str]| {
        if shared_joined.is_empty() {
            rest.join(" ")
        } else {
            format!("{shared_joined} {}", rest.join(" "))
        }
    };
    let full_a = combine(&only_a);
    let full_b = combine(&only_b);

    let mut best = compare(&full_a, &full_b);
    if !shared_joined.is_empty() {
        best = best
            .max(compare(&shared_joined, &full_a))
            .max(compare(&shared_joined, &full_b));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_full() {
        for kind in [ScorerKind::Weighted, ScorerKind::Partial, ScorerKind::Plain] {
            assert_eq!(kind.scorer().score("api.v1.User", "api.v1.User"), 100);
        }
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(WeightedRatio.score("", "User"), 0);
        assert_eq!(PartialRatio.score("user", "..."), 0);
        assert_eq!(PlainRatio.score("", ""), 0);
    }

    #[test]
    fn test_normalization_ignores_case_and_punctuation() {
        assert_eq!(PlainRatio.score("API_V1_USER", "api.v1.user"), 99);
        assert_eq!(PlainRatio.score("API.V1.USER", "api.v1.user"), 100);
    }

    #[test]
    fn test_punctuation_collision_is_not_an_exact_match() {
        for kind in [ScorerKind::Weighted, ScorerKind::Partial, ScorerKind::Plain] {
            let scorer = kind.scorer();
            assert_eq!(scorer.score("api.v1.User", "api_v1.User"), 99);
            assert_eq!(scorer.score("api.v1.user", "api.v1.User"), 100);
        }
    }

    #[test]
    fn test_weighted_uses_partial_match_for_long_candidates() {
        assert_eq!(WeightedRatio.score("user", "api.v1.User"), 90);
    }

    #[test]
    fn test_weighted_ignores_word_order() {
        assert_eq!(WeightedRatio.score("user service", "service user"), 95);
    }

    #[test]
    fn test_partial_finds_word_in_sentence() {
        assert_eq!(PartialRatio.score("account", "Manages user account state"), 100);
    }

    #[test]
    fn test_plain_ratio_counts_edits() {
        assert_eq!(PlainRatio.score("name", "nmae"), 50);
        assert!(PlainRatio.score("email", "user_id") < 60);
    }

    #[test]
    fn test_unrelated_strings_score_low() {
        assert!(WeightedRatio.score("payment", "api.v1.UserRole") < 60);
    }

    #[test]
    fn test_scorer_kind_from_config_string() {
        let kind: ScorerKind = serde_json::from_str("\"partial\"").unwrap();
        assert_eq!(kind, ScorerKind::Partial);
    }
}
