//! Masked mean pooling over per-token encoder output.

use onnxruntime::ndarray::Axis;

use crate::types::TokenEmbeddings;

/// Lower bound applied to the real-token count so fully padded rows divide by a tiny
/// positive number instead of zero.
pub const MIN_TOKEN_COUNT: f32 = 1e-9;

/// Reduces each row of `output` to the mean of its unmasked token vectors.
///
/// The mask is broadcast across the embedding axis, padded positions are zeroed, the
/// remaining vectors are summed over the sequence axis and divided by the clamped number of
/// real tokens. Rows come back in batch order. A row without real tokens pools to zeros.
pub fn mean_pool(output: &TokenEmbeddings) -> Vec<Vec<f32>> {
    let expanded_mask = output.mask().view().insert_axis(Axis(2));
    let masked_sum = (output.hidden() * &expanded_mask).sum_axis(Axis(1));

    let token_counts = output
        .mask()
        .sum_axis(Axis(1))
        .mapv(|count| count.max(MIN_TOKEN_COUNT))
        .insert_axis(Axis(1));

    let pooled = &masked_sum / &token_counts;
    pooled.outer_iter().map(|row| row.to_vec()).collect()
}
