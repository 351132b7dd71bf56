use fxhash::hash64;
use onnxruntime::ndarray::{Array2, Array3};

use crate::{SemanticConfig, SemanticError, TextEncoder, TokenEmbeddings};

/// Value written into padded positions. Non-zero so that pooling that ignores the mask is caught.
const PAD_VALUE: f32 = 0.5;

/// Deterministic encoder used when `mode` is `"fast"`.
///
/// Splits on whitespace, lowercases each token and derives one vector per token from its hash.
/// Identical words therefore map to identical vectors, which keeps similarity ranking meaningful
/// in tests without any model files.
#[derive(Debug, Clone)]
pub struct StubEncoder {
    model_name: String,
    dim: usize,
    max_sequence_length: usize,
}

impl StubEncoder {
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        if cfg.stub_dim == 0 {
            return Err(SemanticError::InvalidConfig(
                "stub_dim must be greater than zero".into(),
            ));
        }
        Ok(Self {
            model_name: format!("{}-stub", cfg.model_name),
            dim: cfg.stub_dim,
            max_sequence_length: cfg.max_sequence_length.max(1),
        })
    }

    fn token_vector(&self, token: &str) -> impl Iterator<Item = f32> {
        let h = hash64(token.to_lowercase().as_bytes());
        (0..self.dim).map(move |idx| ((h >> (idx % 48)) as f32 * 0.0001).sin())
    }
}

impl TextEncoder for StubEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn encode(&self, texts: &[&str]) -> Result<TokenEmbeddings, SemanticError> {
        let tokenized: Vec<Vec<&str>> = texts
            .iter()
            .map(|text| {
                text.split_whitespace()
                    .take(self.max_sequence_length)
                    .collect()
            })
            .collect();
        let seq_len = tokenized.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let batch = texts.len();

        let mut hidden = Vec::with_capacity(batch * seq_len * self.dim);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for tokens in &tokenized {
            for token in tokens {
                hidden.extend(self.token_vector(token));
                mask.push(1.0);
            }
            let pad = seq_len - tokens.len();
            hidden.extend(std::iter::repeat_n(PAD_VALUE, pad * self.dim));
            mask.extend(std::iter::repeat_n(0.0, pad));
        }

        let hidden = Array3::from_shape_vec((batch, seq_len, self.dim), hidden)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let mask = Array2::from_shape_vec((batch, seq_len), mask)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        TokenEmbeddings::new(hidden, mask)
    }
}
