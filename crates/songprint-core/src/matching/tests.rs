//! Tests for similarity scoring and best-match selection

use super::*;
use crate::config::MatchConfig;
use crate::storage_backend::MemoryStore;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_fingerprint(rows: usize, cols: usize, seed: u64) -> Fingerprint {
    let mut rng = StdRng::seed_from_u64(seed);
    Fingerprint::from_rows(
        (0..rows)
            .map(|_| (0..cols).map(|_| u8::from(rng.gen_bool(0.5))).collect())
            .collect(),
    )
}

fn random_vec(len: usize, rng: &mut StdRng) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn full_descriptor(file_name: &str, seed: u64) -> Descriptor {
    let mut rng = StdRng::seed_from_u64(seed);
    Descriptor {
        file_name: file_name.to_string(),
        mfcc_mean: random_vec(120, &mut rng),
        mfcc_std: random_vec(120, &mut rng),
        mfcc_skew: random_vec(120, &mut rng),
        mel_mean: random_vec(128, &mut rng),
        mel_skew: random_vec(128, &mut rng),
        chroma_mean: random_vec(36, &mut rng),
        centroid_profile: random_vec(20, &mut rng),
        tonal_features_mean: random_vec(6, &mut rng),
        energy_distribution: random_vec(10, &mut rng),
        tempo: Some(rng.gen_range(60.0..180.0)),
        pulse_clarity: Some(rng.gen_range(0.1..0.9)),
        fingerprint: random_fingerprint(64, 80, seed),
        ..Default::default()
    }
}

#[test]
fn test_cosine_similarity_range() {
    let a = [1.0, 2.0, 3.0];
    assert_relative_eq!(cosine_similarity(&a, &a), 1.0, epsilon = 1e-12);
    assert_relative_eq!(cosine_similarity(&a, &[-1.0, -2.0, -3.0]), 0.0, epsilon = 1e-12);
    assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.5, epsilon = 1e-12);
}

#[test]
fn test_cosine_similarity_zero_norm_is_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
}

#[test]
fn test_cosine_similarity_clips_to_shorter() {
    let score = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, -50.0, 7.0]);
    assert_relative_eq!(score, 1.0, epsilon = 1e-12);
}

#[test]
fn test_fingerprint_self_similarity() {
    let fp = random_fingerprint(16, 40, 7);
    assert_eq!(fingerprint_similarity(&fp, &fp, 5), 1.0);
}

#[test]
fn test_fingerprint_tolerates_small_shift() {
    let fp = random_fingerprint(16, 60, 11);
    let shifted = Fingerprint::from_rows(fp.as_rows().iter().map(|r| r[3..].to_vec()).collect());

    // 57 common columns allow shifts of up to 5
    assert_eq!(fingerprint_similarity(&shifted, &fp, 5), 1.0);
    assert_eq!(fingerprint_similarity(&fp, &shifted, 5), 1.0);
}

#[test]
fn test_fingerprint_shift_beyond_window_is_not_aligned() {
    let fp = random_fingerprint(16, 60, 13);
    let shifted = Fingerprint::from_rows(fp.as_rows().iter().map(|r| r[8..].to_vec()).collect());
    let score = fingerprint_similarity(&shifted, &fp, 5);
    assert!(score < 0.8, "score {}", score);
}

#[test]
fn test_fingerprint_offset_limited_by_length() {
    // 9 columns leave no room for any shift
    let fp = random_fingerprint(4, 10, 3);
    let shifted = Fingerprint::from_rows(fp.as_rows().iter().map(|r| r[1..].to_vec()).collect());
    let score = fingerprint_similarity(&shifted, &fp, 5);
    assert!(score < 1.0);
}

#[test]
fn test_fingerprint_empty_is_zero() {
    let fp = random_fingerprint(4, 10, 3);
    assert_eq!(fingerprint_similarity(&fp, &Fingerprint::default(), 5), 0.0);
}

#[test]
fn test_exact_match_scores_one() {
    let matcher = Matcher::new(MatchConfig::default());
    let d = full_descriptor("a.wav", 1);
    let sim = matcher.similarity(&d, &d);
    assert!(sim.score >= 0.99, "score {}", sim.score);
    assert_eq!(sim.breakdown.len(), 12);
    for (name, score) in &sim.breakdown {
        assert!((score - 1.0).abs() < 1e-9, "feature {} scored {}", name, score);
    }
}

#[test]
fn test_unrelated_descriptors_score_lower() {
    let matcher = Matcher::new(MatchConfig::default());
    let a = full_descriptor("a.wav", 1);
    let b = full_descriptor("b.wav", 2);
    let sim = matcher.similarity(&a, &b);
    assert!(sim.score < matcher.similarity(&a, &a).score);
    assert!((0.0..=1.0).contains(&sim.score));
}

#[test]
fn test_missing_features_are_skipped() {
    let matcher = Matcher::new(MatchConfig::default());
    let full = full_descriptor("a.wav", 1);
    let mut sparse = full.clone();
    sparse.mfcc_mean.clear();
    sparse.mel_mean.clear();
    sparse.tempo = None;
    sparse.fingerprint = Fingerprint::default();

    let sim = matcher.similarity(&full, &sparse);
    for key in ["mfcc", "mfcc_std", "mfcc_skew", "mel", "mel_skew", "tempo", "pulse_clarity", "fingerprint"] {
        assert!(!sim.breakdown.contains_key(key), "unexpected {}", key);
    }
    for key in ["chroma", "spectral_profile", "tonal", "energy"] {
        assert!(sim.breakdown.contains_key(key), "missing {}", key);
    }
    // Remaining features are identical, so skipping the rest keeps a perfect score
    assert_relative_eq!(sim.score, 1.0, epsilon = 1e-9);
}

#[test]
fn test_no_common_features_scores_zero() {
    let matcher = Matcher::new(MatchConfig::default());
    let a = full_descriptor("a.wav", 1);
    let empty = Descriptor {
        file_name: "b.wav".to_string(),
        ..Default::default()
    };
    let sim = matcher.similarity(&a, &empty);
    assert_eq!(sim.score, 0.0);
    assert!(sim.breakdown.is_empty());
}

#[test]
fn test_non_finite_similarity_reports_zero() {
    let matcher = Matcher::new(MatchConfig::default());
    let a = full_descriptor("a.wav", 1);
    let mut b = a.clone();
    b.mfcc_mean[0] = f32::NAN;
    let sim = matcher.similarity(&a, &b);
    assert_eq!(sim.score, 0.0);
    assert!(sim.breakdown.is_empty());
}

#[test]
fn test_tempo_and_pulse_scores() {
    let matcher = Matcher::new(MatchConfig::default());
    let a = Descriptor {
        tempo: Some(120.0),
        pulse_clarity: Some(0.5),
        ..Default::default()
    };
    let b = Descriptor {
        tempo: Some(120.0 + 53.5),
        pulse_clarity: Some(0.25),
        ..Default::default()
    };
    let sim = matcher.similarity(&a, &b);
    assert_relative_eq!(sim.breakdown["tempo"], 0.5, epsilon = 1e-6);
    assert_relative_eq!(sim.breakdown["pulse_clarity"], 0.5, epsilon = 1e-6);

    let far = Descriptor {
        tempo: Some(300.0),
        ..Default::default()
    };
    let sim = matcher.similarity(&a, &far);
    assert_eq!(sim.breakdown["tempo"], 0.0);
    assert!(!sim.breakdown.contains_key("pulse_clarity"));
}

#[test]
fn test_best_match_empty_store_falls_back() {
    let matcher = Matcher::new(MatchConfig::default());
    let store = MemoryStore::new();
    let result = matcher.best_match(&full_descriptor("q.wav", 1), &store);
    assert!(result.fallback);
    assert!(result.matched.is_none());
    assert!(result.best_id.is_none());
    assert_eq!(result.confidence, 0.3);
    assert_eq!(result.feature_breakdown.get(FALLBACK_KEY), Some(&0.3));
}

#[test]
fn test_best_match_finds_stored_copy() {
    let matcher = Matcher::new(MatchConfig::default());
    let store = MemoryStore::new();
    for (i, name) in ["a.wav", "b.wav", "c.wav"].iter().enumerate() {
        store.add(full_descriptor(name, i as u64 + 1)).unwrap();
    }

    let query = full_descriptor("query.wav", 2);
    let result = matcher.best_match(&query, &store);
    assert!(!result.fallback);
    let matched = result.matched.unwrap();
    assert_eq!(matched.file_name, "b.wav");
    assert_eq!(result.best_id.as_deref(), Some(matched.id.as_str()));
    assert!(result.confidence >= 0.99);
}

#[test]
fn test_best_match_below_threshold_reports_best_id() {
    let config = MatchConfig {
        accept_threshold: 0.999,
        ..Default::default()
    };
    let matcher = Matcher::new(config);
    let store = MemoryStore::new();
    store.add(full_descriptor("a.wav", 1)).unwrap();

    let result = matcher.best_match(&full_descriptor("q.wav", 9), &store);
    assert!(!result.fallback);
    assert!(result.matched.is_none());
    assert!(result.best_id.is_some());
    assert!(result.confidence < 0.999);
    assert!(!result.feature_breakdown.is_empty());
}

#[test]
fn test_best_match_tie_prefers_lower_id() {
    let matcher = Matcher::new(MatchConfig::default());
    let store = MemoryStore::new();
    let template = full_descriptor("x.wav", 4);
    for name in ["first.wav", "second.wav", "third.wav"] {
        store
            .add(Descriptor {
                file_name: name.to_string(),
                ..template.clone()
            })
            .unwrap();
    }

    let lowest = store.list().into_iter().map(|e| e.id).min().unwrap();
    let result = matcher.best_match(&template, &store);
    assert_eq!(result.best_id, Some(lowest));
}
