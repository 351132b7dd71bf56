//! Cosine ranking of unit-length candidates against a query.

use std::collections::HashMap;

use crate::types::{Candidate, Ranking};
use crate::SemanticError;

/// Dot product of two equally sized vectors. For unit vectors this is the cosine similarity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Scores every candidate against `query` and picks the best one.
///
/// Ties keep the earliest candidate. An empty candidate set, or any candidate whose width
/// differs from the query, is rejected with [`SemanticError::InvalidArgument`].
pub fn rank(query: &[f32], candidates: &[Candidate]) -> Result<Ranking, SemanticError> {
    if candidates.is_empty() {
        return Err(SemanticError::InvalidArgument(
            "at least one candidate label is required".into(),
        ));
    }

    if let Some(bad) = candidates.iter().find(|c| c.vector.len() != query.len()) {
        return Err(SemanticError::InvalidArgument(format!(
            "candidate '{}' has dimension {} but the query has {}",
            bad.label,
            bad.vector.len(),
            query.len()
        )));
    }

    let mut scores = HashMap::with_capacity(candidates.len());
    let mut best: Option<(&str, f32)> = None;

    for candidate in candidates {
        let score = cosine_similarity(query, &candidate.vector);
        scores.entry(candidate.label.clone()).or_insert(score);

        let improves = match best {
            Some((_, best_score)) => score > best_score,
            None => true,
        };
        if improves {
            best = Some((candidate.label.as_str(), score));
        }
    }

    // Non-empty input guarantees a winner.
    let (best_label, best_score) = best.ok_or_else(|| {
        SemanticError::InvalidArgument("at least one candidate label is required".into())
    })?;

    Ok(Ranking {
        best_label: best_label.to_string(),
        best_score,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let q = vec![0.6f32, 0.8];
        let ranking = rank(&q, &[Candidate::new("same", q.clone())]).unwrap();
        assert!((ranking.best_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let ranking = rank(&[1.0, 0.0], &[Candidate::new("ortho", vec![0.0, 1.0])]).unwrap();
        assert!(ranking.best_score.abs() < 1e-6);
    }

    #[test]
    fn antiparallel_vectors_score_minus_one() {
        let ranking = rank(&[0.0, 1.0], &[Candidate::new("flip", vec![0.0, -1.0])]).unwrap();
        assert!((ranking.best_score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn picks_highest_score() {
        let candidates = vec![
            Candidate::new("water", vec![0.0, 1.0]),
            Candidate::new("roads", vec![0.8, 0.6]),
            Candidate::new("power", vec![-1.0, 0.0]),
        ];
        let ranking = rank(&[1.0, 0.0], &candidates).unwrap();

        assert_eq!(ranking.best_label, "roads");
        assert!((ranking.best_score - 0.8).abs() < 1e-6);
        assert_eq!(ranking.scores.len(), 3);
        assert!((ranking.scores["power"] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_resolve_to_first_in_input_order() {
        let candidates = vec![
            Candidate::new("low", vec![0.0, 1.0]),
            Candidate::new("first", vec![1.0, 0.0]),
            Candidate::new("second", vec![1.0, 0.0]),
        ];
        let ranking = rank(&[1.0, 0.0], &candidates).unwrap();
        assert_eq!(ranking.best_label, "first");
    }

    #[test]
    fn every_label_gets_a_score() {
        let labels = ["a", "b", "c", "d"];
        let candidates: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Candidate::new(*l, vec![i as f32, 1.0]))
            .collect();
        let ranking = rank(&[0.0, 1.0], &candidates).unwrap();
        for label in labels {
            assert!(ranking.scores.contains_key(label), "missing {label}");
        }
    }

    #[test]
    fn empty_candidates_is_invalid_argument() {
        let err = rank(&[1.0, 0.0], &[]).unwrap_err();
        assert!(matches!(err, SemanticError::InvalidArgument(_)));
    }

    #[test]
    fn dimension_mismatch_is_invalid_argument() {
        let err = rank(&[1.0, 0.0], &[Candidate::new("short", vec![1.0])]).unwrap_err();
        assert!(matches!(err, SemanticError::InvalidArgument(msg) if msg.contains("short")));
    }
}
