use onnxruntime::ndarray::{Array, Array2, Array3, Ix3};
use onnxruntime::session::Session;
use std::cell::RefCell;
use tokenizers::Tokenizer;

use crate::assets::{resolve_model_assets, ModelAssets};
use crate::cache::{encoder_handle, EncoderHandle};
use crate::{SemanticConfig, SemanticError, TextEncoder, TokenEmbeddings};

/// Name of the per-token output exported by sentence-transformer style models.
const HIDDEN_STATE_OUTPUT: &str = "last_hidden_state";

/// Transformer encoder backed by ONNX Runtime and a HuggingFace tokenizer.
///
/// The struct only carries asset paths; the session itself lives in a thread-local cache so the
/// encoder can be shared across blocking worker threads.
#[derive(Debug, Clone)]
pub struct OnnxEncoder {
    model_name: String,
    assets: ModelAssets,
    max_sequence_length: usize,
}

impl OnnxEncoder {
    /// Resolves (and if configured, downloads) model assets, then loads the session once so
    /// broken models are reported at startup.
    pub async fn load(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        if cfg.max_sequence_length == 0 {
            return Err(SemanticError::InvalidConfig(
                "max_sequence_length must be greater than zero".into(),
            ));
        }
        if !cfg.device.eq_ignore_ascii_case("cpu") {
            tracing::warn!(device = %cfg.device, "only CPU execution is supported, falling back to cpu");
        }

        let assets = resolve_model_assets(cfg).await?;
        encoder_handle(&assets)?;
        tracing::info!(
            model = %cfg.model_name,
            path = %assets.model_path.display(),
            "embedding model loaded"
        );

        Ok(Self {
            model_name: cfg.model_name.clone(),
            assets,
            max_sequence_length: cfg.max_sequence_length,
        })
    }
}

impl TextEncoder for OnnxEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn encode(&self, texts: &[&str]) -> Result<TokenEmbeddings, SemanticError> {
        let handle = encoder_handle(&self.assets)?;
        run_encoder(&handle, texts, self.max_sequence_length)
    }
}

fn run_encoder(
    handle: &EncoderHandle,
    texts: &[&str],
    max_sequence_length: usize,
) -> Result<TokenEmbeddings, SemanticError> {
    let (encoded, max_len) = encode_documents(&handle.tokenizer, texts, max_sequence_length)?;
    let (input_ids, attn_mask) = build_padded_arrays(encoded, max_len)?;
    let mask = attn_mask.mapv(|m| m as f32);

    if texts.is_empty() {
        return TokenEmbeddings::new(Array3::zeros((0, mask.ncols(), 0)), mask);
    }

    let hidden = execute_session(&handle.session, input_ids, attn_mask)?;
    TokenEmbeddings::new(hidden, mask)
}

struct EncodedDoc {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

fn encode_documents(
    tokenizer: &Tokenizer,
    texts: &[&str],
    max_sequence_length: usize,
) -> Result<(Vec<EncodedDoc>, usize), SemanticError> {
    let mut encoded = Vec::with_capacity(texts.len());
    let mut max_len = 0usize;

    for text in texts {
        let encoding = tokenizer
            .encode(*text, true)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        ids.truncate(max_sequence_length);
        mask.truncate(max_sequence_length);
        max_len = max_len.max(ids.len());
        encoded.push(EncodedDoc { ids, mask });
    }

    Ok((encoded, max_len))
}

fn build_padded_arrays(
    encoded: Vec<EncodedDoc>,
    max_len: usize,
) -> Result<(Array2<i64>, Array2<i64>), SemanticError> {
    let seq_len = max_len.max(1);
    let batch = encoded.len();
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedDoc { ids, mask } in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        let pad = seq_len.saturating_sub(ids.len());
        id_storage.extend(ids);
        mask_storage.extend(mask);
        id_storage.extend(std::iter::repeat_n(0, pad));
        mask_storage.extend(std::iter::repeat_n(0, pad));
    }

    let input_ids = Array::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attn_mask = Array::from_shape_vec((batch, seq_len), mask_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    Ok((input_ids, attn_mask))
}

fn execute_session(
    session: &RefCell<Session<'static>>,
    input_ids: Array2<i64>,
    attn_mask: Array2<i64>,
) -> Result<Array3<f32>, SemanticError> {
    let (batch, seq_len) = input_ids.dim();
    let mut guard = session.borrow_mut();
    let session_ref = &mut *guard;
    let mut runtime_inputs = Vec::with_capacity(session_ref.inputs.len());
    let mut input_ids_tensor = Some(input_ids);
    let mut attn_mask_tensor = Some(attn_mask);

    for input in &session_ref.inputs {
        match input.name.as_str() {
            "input_ids" => {
                let tensor = input_ids_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig(
                        "model requested `input_ids` multiple times".into(),
                    )
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "attention_mask" => {
                let tensor = attn_mask_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig(
                        "model requested `attention_mask` multiple times".into(),
                    )
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "token_type_ids" => {
                let tensor = Array::from_elem((batch, seq_len), 0_i64);
                runtime_inputs.push(tensor.into_dyn());
            }
            other => {
                return Err(SemanticError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        }
    }

    if runtime_inputs.is_empty() {
        return Err(SemanticError::Inference(
            "model did not declare any inputs".into(),
        ));
    }

    let named_index = session_ref
        .outputs
        .iter()
        .position(|output| output.name == HIDDEN_STATE_OUTPUT);

    let outputs = session_ref
        .run::<i64, f32, _>(runtime_inputs)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;

    let tensor = match named_index {
        Some(index) => outputs.get(index),
        None => outputs.iter().find(|tensor| tensor.ndim() == 3),
    }
    .ok_or_else(|| SemanticError::Inference("model exposes no per-token output".into()))?;

    let shape = tensor.shape().to_vec();
    if shape.len() != 3 || shape[0] != batch || shape[1] != seq_len {
        return Err(SemanticError::Inference(format!(
            "unexpected hidden state shape {shape:?} for batch {batch} x {seq_len}"
        )));
    }

    tensor
        .view()
        .to_owned()
        .into_dimensionality::<Ix3>()
        .map_err(|e| SemanticError::Inference(e.to_string()))
}
