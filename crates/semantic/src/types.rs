use onnxruntime::ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::SemanticError;

/// Raw encoder output for one batch: per-token vectors plus the aligned attention mask.
///
/// `hidden` is `batch × sequence × dim`, `mask` is `batch × sequence` with `1.0` for real tokens
/// and `0.0` for padding. Every row in a batch shares the same padded sequence length.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEmbeddings {
    hidden: Array3<f32>,
    mask: Array2<f32>,
}

impl TokenEmbeddings {
    /// Pairs per-token vectors with their mask, rejecting mismatched batch/sequence axes.
    pub fn new(hidden: Array3<f32>, mask: Array2<f32>) -> Result<Self, SemanticError> {
        let (batch, seq_len, _) = hidden.dim();
        if mask.dim() != (batch, seq_len) {
            return Err(SemanticError::Inference(format!(
                "token mask shape {:?} does not match hidden states {:?}",
                mask.dim(),
                hidden.dim()
            )));
        }
        Ok(Self { hidden, mask })
    }

    pub fn hidden(&self) -> &Array3<f32> {
        &self.hidden
    }

    pub fn mask(&self) -> &Array2<f32> {
        &self.mask
    }

    pub fn batch_size(&self) -> usize {
        self.hidden.dim().0
    }

    pub fn sequence_length(&self) -> usize {
        self.hidden.dim().1
    }

    pub fn embedding_dim(&self) -> usize {
        self.hidden.dim().2
    }
}

/// One labelled vector competing in a ranking. Input order is the tie-break priority.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub vector: Vec<f32>,
}

impl Candidate {
    pub fn new(label: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            vector,
        }
    }
}

/// Outcome of ranking a query vector against a candidate set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ranking {
    pub best_label: String,
    pub best_score: f32,
    /// One score per distinct input label.
    pub scores: HashMap<String, f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_embeddings_accepts_matching_shapes() {
        let output = TokenEmbeddings::new(Array3::zeros((2, 5, 8)), Array2::ones((2, 5))).unwrap();
        assert_eq!(output.batch_size(), 2);
        assert_eq!(output.sequence_length(), 5);
        assert_eq!(output.embedding_dim(), 8);
    }

    #[test]
    fn token_embeddings_rejects_mask_mismatch() {
        let err = TokenEmbeddings::new(Array3::zeros((2, 5, 8)), Array2::ones((2, 4))).unwrap_err();
        assert!(matches!(err, SemanticError::Inference(_)));
    }

    #[test]
    fn token_embeddings_allows_empty_sequences() {
        let output = TokenEmbeddings::new(Array3::zeros((1, 0, 4)), Array2::zeros((1, 0))).unwrap();
        assert_eq!(output.sequence_length(), 0);
        assert_eq!(output.embedding_dim(), 4);
    }

    #[test]
    fn candidate_new_takes_any_label() {
        let c = Candidate::new("Roads", vec![1.0, 0.0]);
        assert_eq!(c.label, "Roads");
        assert_eq!(c.vector, vec![1.0, 0.0]);
    }
}
