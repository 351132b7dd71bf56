//! Per-thread ONNX session registry.
//!
//! `onnxruntime` sessions are `!Send`, so each blocking worker opens its own copy of a model the
//! first time it serves a request and keeps it for later ones. The text encoder and the image
//! safety detector both draw their sessions from here, keyed by model path.

use once_cell::sync::OnceCell;
use onnxruntime::{environment::Environment, session::Session};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tokenizers::Tokenizer;

use crate::assets::ModelAssets;
use crate::SemanticError;

/// A session owned by the current thread.
pub type SharedSession = Rc<RefCell<Session<'static>>>;

static RUNTIME: OnceCell<Environment> = OnceCell::new();

thread_local! {
    static SESSIONS: RefCell<HashMap<PathBuf, SharedSession>> = RefCell::new(HashMap::new());
    static TOKENIZERS: RefCell<HashMap<PathBuf, Rc<Tokenizer>>> = RefCell::new(HashMap::new());
}

/// Tokenizer and session for one text encoder, both resident on the calling thread.
pub(crate) struct EncoderHandle {
    pub(crate) tokenizer: Rc<Tokenizer>,
    pub(crate) session: SharedSession,
}

/// Tokenizer first: a missing tokenizer should not leave a session loaded behind it.
pub(crate) fn encoder_handle(assets: &ModelAssets) -> Result<EncoderHandle, SemanticError> {
    let tokenizer = cached_tokenizer(&assets.tokenizer_path)?;
    let session = cached_session(&assets.model_path)?;
    Ok(EncoderHandle { tokenizer, session })
}

fn cached_tokenizer(path: &Path) -> Result<Rc<Tokenizer>, SemanticError> {
    TOKENIZERS.with(|tokenizers| {
        if let Some(tokenizer) = tokenizers.borrow().get(path) {
            return Ok(tokenizer.clone());
        }
        let tokenizer = Rc::new(
            Tokenizer::from_file(path).map_err(|e| SemanticError::Inference(e.to_string()))?,
        );
        tokenizers
            .borrow_mut()
            .insert(path.to_path_buf(), tokenizer.clone());
        Ok(tokenizer)
    })
}

/// Returns this thread's session for `model_path`, opening it on first use.
///
/// Failed loads are not cached; the next call retries.
pub fn cached_session(model_path: &Path) -> Result<SharedSession, SemanticError> {
    SESSIONS.with(|sessions| {
        if let Some(session) = sessions.borrow().get(model_path) {
            return Ok(session.clone());
        }
        let session = Rc::new(RefCell::new(open_session(model_path)?));
        sessions
            .borrow_mut()
            .insert(model_path.to_path_buf(), session.clone());
        tracing::debug!(path = %model_path.display(), "onnx session opened on worker thread");
        Ok(session)
    })
}

fn open_session(model_path: &Path) -> Result<Session<'static>, SemanticError> {
    let runtime = RUNTIME.get_or_try_init(|| {
        Environment::builder()
            .with_name("civic-ai")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })?;
    runtime
        .new_session_builder()
        .map_err(|e| SemanticError::Inference(e.to_string()))?
        .with_model_from_file(model_path.to_path_buf())
        .map_err(|e| SemanticError::Inference(format!("{}: {e}", model_path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tokenizer_loads_nothing() {
        let assets = ModelAssets {
            model_path: PathBuf::from("./missing/model.onnx"),
            tokenizer_path: PathBuf::from("./missing/tokenizer.json"),
        };
        assert!(matches!(
            encoder_handle(&assets),
            Err(SemanticError::Inference(_))
        ));
        TOKENIZERS.with(|t| assert!(t.borrow().is_empty()));
        SESSIONS.with(|s| assert!(s.borrow().is_empty()));
    }
}
