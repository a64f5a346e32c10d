use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::weights::Weights;
use crate::embedding::{EntityEmbedding, FeatureVector};

/// Candidate embeddings laid out per feature: one vector per candidate,
/// in candidate order, for every feature fetched from the store.
pub type CandidateMatrix = HashMap<String, Vec<FeatureVector>>;

/// Candidates ranked by descending score.
pub type RankedResult = Vec<(i64, f64)>;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error(
        "dimension mismatch on feature '{feature}': base is {base} wide, candidate {candidate} is {got} wide"
    )]
    DimensionMismatch {
        feature: String,
        base: usize,
        candidate: usize,
        got: usize,
    },
    #[error("feature '{feature}' has {got} candidate vectors, expected {expected}")]
    CandidateCountMismatch {
        feature: String,
        expected: usize,
        got: usize,
    },
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

/// Min-max scale to [0, 1]. When every value is equal the output is all
/// zeros: a feature with uniform similarity carries no differentiating
/// signal, and zeroing it avoids the max == min division.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    if max == min {
        return vec![0.0; values.len()];
    }

    values.iter().map(|v| (v - min) / (max - min)).collect()
}

/// Rank `candidate_count` candidates against one base embedding.
///
/// For each feature present on both sides, takes the dot product of the
/// base vector with every candidate vector, min-max normalizes the
/// per-feature similarities, and accumulates them weighted. Features
/// missing from either side contribute nothing. Ties keep candidate
/// order (stable sort on score only).
pub fn rank_candidates(
    base: &EntityEmbedding,
    candidates: &CandidateMatrix,
    candidate_count: usize,
    weights: &Weights,
) -> Result<Vec<(usize, f64)>, ScoringError> {
    if candidate_count == 0 {
        return Ok(Vec::new());
    }

    let weight_sum = weights.sum();
    if (weight_sum - 1.0).abs() > 1e-6 {
        debug!(weight_sum, "scoring with unnormalized weights");
    }

    let mut scores = vec![0.0f64; candidate_count];

    for (feature, base_vector) in base {
        let Some(columns) = candidates.get(feature) else {
            continue;
        };

        if columns.len() != candidate_count {
            return Err(ScoringError::CandidateCountMismatch {
                feature: feature.clone(),
                expected: candidate_count,
                got: columns.len(),
            });
        }

        let mut raw = Vec::with_capacity(candidate_count);
        for (idx, candidate_vector) in columns.iter().enumerate() {
            if candidate_vector.len() != base_vector.len() {
                return Err(ScoringError::DimensionMismatch {
                    feature: feature.clone(),
                    base: base_vector.len(),
                    candidate: idx,
                    got: candidate_vector.len(),
                });
            }
            raw.push(dot(base_vector, candidate_vector));
        }

        let weight = weights.for_feature(feature);
        for (score, normalized) in scores.iter_mut().zip(min_max_normalize(&raw)) {
            *score += weight * normalized;
        }
    }

    let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    Ok(ranked)
}

/// Replace candidate indices with the ids the caller supplied, keeping
/// rank order.
pub fn attach_ids(ids: &[i64], ranked: &[(usize, f64)]) -> RankedResult {
    ranked.iter().map(|(idx, score)| (ids[*idx], *score)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_with(feature: &str, vector: Vec<f32>) -> EntityEmbedding {
        let mut base = EntityEmbedding::new();
        base.insert(feature.to_string(), vector);
        base
    }

    fn matrix_with(feature: &str, columns: Vec<Vec<f32>>) -> CandidateMatrix {
        let mut matrix = CandidateMatrix::new();
        matrix.insert(feature.to_string(), columns);
        matrix
    }

    #[test]
    fn normalizes_to_unit_interval() {
        let normalized = min_max_normalize(&[3.0, 1.0, 2.0]);
        assert_eq!(normalized, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn uniform_values_normalize_to_zeros() {
        assert_eq!(min_max_normalize(&[0.7, 0.7, 0.7]), vec![0.0, 0.0, 0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn matching_candidate_outranks_orthogonal_candidate() {
        let base = base_with("title", vec![1.0, 0.0]);
        let matrix = matrix_with("title", vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let weights = Weights {
            title: 1.0,
            content: 0.0,
            work_type: 0.0,
            skills: 0.0,
        };

        let ranked = rank_candidates(&base, &matrix, 2, &weights).unwrap();

        assert_eq!(ranked[0], (0, 1.0));
        assert_eq!(ranked[1], (1, 0.0));
    }

    #[test]
    fn zero_candidates_rank_to_empty_result() {
        let base = base_with("title", vec![1.0]);
        let ranked = rank_candidates(&base, &CandidateMatrix::new(), 0, &Weights::default());
        assert_eq!(ranked.unwrap(), Vec::new());
    }

    #[test]
    fn single_candidate_scores_zero_but_is_returned() {
        let base = base_with("title", vec![1.0, 0.0]);
        let matrix = matrix_with("title", vec![vec![1.0, 0.0]]);

        let ranked = rank_candidates(&base, &matrix, 1, &Weights::default()).unwrap();

        assert_eq!(ranked, vec![(0, 0.0)]);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let base = base_with("title", vec![1.0, 0.0]);
        // Two identical candidates and one weaker one.
        let matrix = matrix_with(
            "title",
            vec![vec![0.8, 0.0], vec![0.8, 0.0], vec![0.1, 0.0]],
        );
        let weights = Weights {
            title: 1.0,
            content: 0.0,
            work_type: 0.0,
            skills: 0.0,
        };

        let ranked = rank_candidates(&base, &matrix, 3, &weights).unwrap();

        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 1);
        assert_eq!(ranked[2].0, 2);
    }

    #[test]
    fn features_missing_from_candidates_are_skipped() {
        let mut base = base_with("title", vec![1.0, 0.0]);
        base.insert("content".to_string(), vec![0.5, 0.5]);
        let matrix = matrix_with("title", vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        let ranked = rank_candidates(&base, &matrix, 2, &Weights::default()).unwrap();

        // Only title contributes; its weight is 0.4.
        assert!((ranked[0].1 - 0.4).abs() < 1e-9);
    }

    #[test]
    fn dimension_mismatch_fails_loudly() {
        let base = base_with("title", vec![1.0, 0.0]);
        let matrix = matrix_with("title", vec![vec![1.0, 0.0, 0.0]]);

        let err = rank_candidates(&base, &matrix, 1, &Weights::default()).unwrap_err();

        assert!(matches!(err, ScoringError::DimensionMismatch { .. }));
    }

    #[test]
    fn short_feature_column_fails_loudly() {
        let base = base_with("title", vec![1.0]);
        let matrix = matrix_with("title", vec![vec![1.0]]);

        let err = rank_candidates(&base, &matrix, 2, &Weights::default()).unwrap_err();

        assert!(matches!(err, ScoringError::CandidateCountMismatch { .. }));
    }

    #[test]
    fn attaches_caller_ids_in_rank_order() {
        let ranked = vec![(2, 0.9), (0, 0.5), (1, 0.5)];
        let with_ids = attach_ids(&[11, 22, 33], &ranked);
        assert_eq!(with_ids, vec![(33, 0.9), (11, 0.5), (22, 0.5)]);
    }
}
