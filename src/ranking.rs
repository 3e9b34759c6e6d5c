//! Top-k selection over class probabilities and the response records built
//! from it.

use std::cmp::Ordering;

use serde::Serialize;

use crate::labels::{LabelSet, pattern_name};

pub const TOP_K: usize = 3;
pub const UNKNOWN_PATTERN: &str = "Unknown";

const HIGH_THRESHOLD: f64 = 0.8;
const MEDIUM_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    High,
    Medium,
    Low,
}

impl MatchTier {
    /// Both thresholds are exclusive: exactly 0.8 is medium, exactly 0.5 is low.
    pub fn from_probability(p: f64) -> Self {
        if p > HIGH_THRESHOLD {
            MatchTier::High
        } else if p > MEDIUM_THRESHOLD {
            MatchTier::Medium
        } else {
            MatchTier::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMatch {
    pub pattern: String,
    pub code: String,
    pub score: f64,
    #[serde(rename = "match")]
    pub tier: MatchTier,
}

impl PatternMatch {
    pub fn new(code: &str, probability: f64) -> Self {
        Self {
            pattern: pattern_name(code),
            code: code.to_string(),
            score: to_percent(probability),
            tier: MatchTier::from_probability(probability),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub detected: String,
    pub alternatives: Vec<PatternMatch>,
}

impl Prediction {
    pub fn from_probabilities(probabilities: &[f32], labels: &LabelSet) -> Self {
        let alternatives: Vec<PatternMatch> = top_k(probabilities, TOP_K)
            .into_iter()
            .filter_map(|i| {
                labels
                    .get(i)
                    .map(|code| PatternMatch::new(code, probabilities[i] as f64))
            })
            .collect();
        let detected = alternatives
            .first()
            .map(|m| m.pattern.clone())
            .unwrap_or_else(|| UNKNOWN_PATTERN.to_string());
        Self {
            detected,
            alternatives,
        }
    }

    pub fn best(&self) -> Option<&PatternMatch> {
        self.alternatives.first()
    }
}

/// Indices of the `k` largest values, largest first.
///
/// Equal values keep ascending index order and NaN ranks below every number.
pub fn top_k(values: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| compare_desc(values[a], values[b]));
    indices.truncate(k);
    indices
}

fn compare_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Probability as a percentage rounded to one decimal place.
fn to_percent(p: f64) -> f64 {
    (p * 1000.0).round() / 10.0
}
