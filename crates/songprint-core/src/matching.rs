//! Similarity scoring and best-match selection
//!
//! Each feature family contributes a sub-score in [0, 1]; the fused score
//! is their weighted mean over the sub-scores both descriptors can supply.

use crate::config::MatchConfig;
use crate::storage_backend::FeatureStore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use songprint_fp::{Descriptor, Fingerprint};
use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

/// Breakdown key used for the empty-store fallback
pub const FALLBACK_KEY: &str = "feature_based";

/// Fused score and the sub-scores it was built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

/// Outcome of a library query
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Best candidate if it reached the acceptance threshold
    pub matched: Option<Descriptor>,
    /// Id of the best-scoring candidate, accepted or not
    pub best_id: Option<String>,
    pub confidence: f64,
    pub feature_breakdown: BTreeMap<String, f64>,
    /// Set when the store was empty and no candidate could be scored
    pub fallback: bool,
}

impl MatchResult {
    fn fallback(confidence: f64) -> Self {
        Self {
            matched: None,
            best_id: None,
            confidence,
            feature_breakdown: BTreeMap::from([(FALLBACK_KEY.to_string(), confidence)]),
            fallback: true,
        }
    }
}

/// Cosine similarity rescaled to `(cos + 1) / 2`.
///
/// Vectors are clipped to the shorter length; a zero norm gives 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Best fraction of agreeing bits over column shifts of up to
/// `min(max_offset, min_cols / 10)`.
///
/// Both fingerprints are clipped to their common leading rows and columns
/// first, so trailing columns of the longer one never take part.
pub fn fingerprint_similarity(a: &Fingerprint, b: &Fingerprint, max_offset: usize) -> f64 {
    let rows = a.rows().min(b.rows());
    let cols = a.cols().min(b.cols());
    if rows == 0 || cols == 0 {
        return 0.0;
    }

    let max_offset = max_offset.min(cols / 10) as isize;
    let cols = cols as isize;
    let mut best = 0.0f64;
    for k in -max_offset..=max_offset {
        let start = (-k).max(0);
        let end = cols.min(cols - k);
        if end <= start {
            continue;
        }
        let mut agree = 0usize;
        for i in 0..rows {
            for j in start..end {
                if a.get(i, j as usize) == b.get(i, (j + k) as usize) {
                    agree += 1;
                }
            }
        }
        let total = rows * (end - start) as usize;
        best = best.max(agree as f64 / total as f64);
    }
    best
}

fn tempo_similarity(a: f32, b: f32, range: f64) -> f64 {
    (1.0 - (a as f64 - b as f64).abs() / range).clamp(0.0, 1.0)
}

fn pulse_similarity(a: f32, b: f32, epsilon: f64) -> f64 {
    let (a, b) = (a as f64, b as f64);
    let scale = a.max(b).max(epsilon);
    (1.0 - ((a - b).abs() / scale).min(1.0)).clamp(0.0, 1.0)
}

/// Scores descriptor pairs and picks the best stored candidate.
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Weighted similarity of two descriptors. Never fails: a non-finite
    /// result is reported as 0 with an empty breakdown.
    pub fn similarity(&self, query: &Descriptor, candidate: &Descriptor) -> Similarity {
        let weights = &self.config.weights;
        let mut parts: Vec<(&'static str, f64, f64)> = Vec::new();
        let both = |a: &[f32], b: &[f32]| !a.is_empty() && !b.is_empty();

        if both(&query.mfcc_mean, &candidate.mfcc_mean) {
            let n = query.mfcc_mean.len().min(candidate.mfcc_mean.len());
            parts.push(("mfcc", cosine_similarity(&query.mfcc_mean, &candidate.mfcc_mean), weights.mfcc));
            if both(&query.mfcc_std, &candidate.mfcc_std) {
                let score = cosine_similarity(clip(&query.mfcc_std, n), clip(&candidate.mfcc_std, n));
                parts.push(("mfcc_std", score, weights.mfcc_std));
            }
            if both(&query.mfcc_skew, &candidate.mfcc_skew) {
                let score = cosine_similarity(clip(&query.mfcc_skew, n), clip(&candidate.mfcc_skew, n));
                parts.push(("mfcc_skew", score, weights.mfcc_skew));
            }
        }

        if both(&query.mel_mean, &candidate.mel_mean) {
            parts.push(("mel", cosine_similarity(&query.mel_mean, &candidate.mel_mean), weights.mel));
            if both(&query.mel_skew, &candidate.mel_skew) {
                let score = cosine_similarity(&query.mel_skew, &candidate.mel_skew);
                parts.push(("mel_skew", score, weights.mel_skew));
            }
        }

        let vector_features: [(&'static str, &[f32], &[f32], f64); 4] = [
            ("chroma", &query.chroma_mean, &candidate.chroma_mean, weights.chroma),
            (
                "spectral_profile",
                &query.centroid_profile,
                &candidate.centroid_profile,
                weights.spectral_profile,
            ),
            (
                "tonal",
                &query.tonal_features_mean,
                &candidate.tonal_features_mean,
                weights.tonal,
            ),
            (
                "energy",
                &query.energy_distribution,
                &candidate.energy_distribution,
                weights.energy,
            ),
        ];
        for (name, a, b, weight) in vector_features {
            if both(a, b) {
                parts.push((name, cosine_similarity(a, b), weight));
            }
        }

        if let (Some(tq), Some(tc)) = (query.tempo, candidate.tempo) {
            parts.push(("tempo", tempo_similarity(tq, tc, self.config.tempo_range), weights.tempo));
            if let (Some(pq), Some(pc)) = (query.pulse_clarity, candidate.pulse_clarity) {
                let score = pulse_similarity(pq, pc, self.config.pulse_epsilon);
                parts.push(("pulse_clarity", score, weights.pulse_clarity));
            }
        }

        if !query.fingerprint.is_empty() && !candidate.fingerprint.is_empty() {
            let score = fingerprint_similarity(
                &query.fingerprint,
                &candidate.fingerprint,
                self.config.max_fingerprint_offset,
            );
            parts.push(("fingerprint", score, weights.fingerprint));
        }

        let weight_sum: f64 = parts.iter().map(|(_, _, w)| w).sum();
        let weighted: f64 = parts.iter().map(|(_, s, w)| s * w).sum();
        let score = if weight_sum > 0.0 { weighted / weight_sum } else { 0.0 };

        if !score.is_finite() {
            log::warn!("Non-finite similarity between {} and {}", query.id, candidate.id);
            return Similarity::default();
        }

        Similarity {
            score: score.clamp(0.0, 1.0),
            breakdown: parts
                .into_iter()
                .map(|(name, s, _)| (name.to_string(), s))
                .collect(),
        }
    }

    /// Score every stored descriptor against `query` and keep the best.
    ///
    /// Ties go to the lower id. An empty store yields the fallback result.
    pub fn best_match(&self, query: &Descriptor, store: &dyn FeatureStore) -> MatchResult {
        let entries = store.list();
        let best = entries
            .par_iter()
            .filter_map(|entry| {
                let candidate = store.get(&entry.id)?;
                let similarity = self.similarity(query, &candidate);
                Some((similarity, candidate))
            })
            .reduce_with(|a, b| {
                let a_wins = a.0.score > b.0.score
                    || (a.0.score == b.0.score && a.1.id <= b.1.id);
                if a_wins {
                    a
                } else {
                    b
                }
            });

        let Some((similarity, candidate)) = best else {
            log::info!("No candidates to score, returning fallback");
            return MatchResult::fallback(self.config.fallback_confidence);
        };

        let accepted = similarity.score >= self.config.accept_threshold;
        log::info!(
            "Best candidate {} ({}) scored {:.4} out of {} entries{}",
            candidate.id,
            candidate.file_name,
            similarity.score,
            entries.len(),
            if accepted { "" } else { ", below threshold" }
        );

        MatchResult {
            best_id: Some(candidate.id.clone()),
            matched: accepted.then_some(candidate),
            confidence: similarity.score,
            feature_breakdown: similarity.breakdown,
            fallback: false,
        }
    }
}

fn clip(v: &[f32], n: usize) -> &[f32] {
    &v[..v.len().min(n)]
}
