//! Text embedding for the civic AI service.
//!
//! Turns free text into unit-length vectors and ranks candidate labels against them.
//! The pipeline has three pieces:
//!
//! - **Encoder** - anything implementing [`TextEncoder`]: per-token vectors plus an attention
//!   mask for a batch of texts. [`OnnxEncoder`] runs a local transformer, [`StubEncoder`] is a
//!   deterministic stand-in for tests and demos.
//! - **Aggregator** - [`mean_pool`] followed by [`l2_normalize_in_place`], wrapped up as
//!   [`embed_texts`].
//! - **Ranker** - [`rank`] scores a query against labelled candidates with a dot product and
//!   picks the best one (first wins on ties).
//!
//! ## Threading notes
//!
//! ONNX sessions are cached per thread. The first `encode` call on a worker thread loads the
//! session, later calls reuse it. Calls are blocking, so async callers should hop onto
//! `spawn_blocking`.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{classify_text, load_encoder, SemanticConfig};
//!
//! # async fn run() -> Result<(), semantic::SemanticError> {
//! let cfg = SemanticConfig { mode: "fast".into(), ..Default::default() };
//! let encoder = load_encoder(&cfg).await?;
//! let ranking = classify_text(encoder.as_ref(), "No water since Monday", &["water", "roads"])?;
//! println!("{} ({:.3})", ranking.best_label, ranking.best_score);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod assets;
mod cache;
mod normalize;
mod onnx;
mod pooling;
mod rank;
mod stub;

use std::sync::Arc;

pub use crate::assets::ensure_local_file;
pub use crate::cache::{cached_session, SharedSession};
pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::normalize::{l2_norm, l2_normalize_in_place};
pub use crate::onnx::OnnxEncoder;
pub use crate::pooling::{mean_pool, MIN_TOKEN_COUNT};
pub use crate::rank::{cosine_similarity, rank};
pub use crate::stub::StubEncoder;
pub use crate::types::{Candidate, Ranking, TokenEmbeddings};

/// Produces per-token vectors and an aligned mask for a batch of texts.
///
/// Every text in one call is padded to the same sequence length. Implementations are blocking.
pub trait TextEncoder: Send + Sync {
    /// Label used in logs and readiness reports.
    fn model_name(&self) -> &str;

    fn encode(&self, texts: &[&str]) -> Result<TokenEmbeddings, SemanticError>;
}

/// Encodes `texts` and reduces each one to a unit-length embedding, preserving input order.
///
/// Texts with no real tokens come back as zero vectors.
pub fn embed_texts(
    encoder: &dyn TextEncoder,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>, SemanticError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let output = encoder.encode(texts)?;
    if output.batch_size() != texts.len() {
        return Err(SemanticError::Inference(format!(
            "encoder returned {} rows for {} inputs",
            output.batch_size(),
            texts.len()
        )));
    }

    let mut vectors = mean_pool(&output);
    for vector in &mut vectors {
        l2_normalize_in_place(vector);
    }
    Ok(vectors)
}

/// Embeds `text` together with every label in one batch and ranks the labels against the text.
pub fn classify_text(
    encoder: &dyn TextEncoder,
    text: &str,
    labels: &[&str],
) -> Result<Ranking, SemanticError> {
    if labels.is_empty() {
        return Err(SemanticError::InvalidArgument(
            "at least one candidate label is required".into(),
        ));
    }
    if labels.iter().any(|label| label.trim().is_empty()) {
        return Err(SemanticError::InvalidArgument(
            "candidate labels must not be empty".into(),
        ));
    }

    let mut batch = Vec::with_capacity(labels.len() + 1);
    batch.push(text);
    batch.extend_from_slice(labels);

    let mut vectors = embed_texts(encoder, &batch)?.into_iter();
    let query = vectors
        .next()
        .ok_or_else(|| SemanticError::Inference("encoder returned no outputs".into()))?;
    let candidates: Vec<Candidate> = labels
        .iter()
        .zip(vectors)
        .map(|(label, vector)| Candidate::new(*label, vector))
        .collect();

    rank(&query, &candidates)
}

/// Builds the encoder selected by `cfg.mode`.
///
/// `"fast"` returns the [`StubEncoder`]; `"onnx"` resolves assets and loads the model. Missing
/// assets are an error, there is no silent fallback to the stub.
pub async fn load_encoder(cfg: &SemanticConfig) -> Result<Arc<dyn TextEncoder>, SemanticError> {
    match cfg.mode.as_str() {
        "fast" => Ok(Arc::new(StubEncoder::new(cfg)?)),
        "onnx" => Ok(Arc::new(OnnxEncoder::load(cfg).await?)),
        other => Err(SemanticError::InvalidConfig(format!(
            "unknown encoder mode '{other}'"
        ))),
    }
}
