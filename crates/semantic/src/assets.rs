use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{SemanticConfig, SemanticError};

#[derive(Debug, Clone)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Ensures that the model and tokenizer exist locally, downloading them when URLs are provided.
pub(crate) async fn resolve_model_assets(
    cfg: &SemanticConfig,
) -> Result<ModelAssets, SemanticError> {
    let auth = cfg.auth_header.as_deref();
    let model_path = ensure_local_file(&cfg.model_path, cfg.model_url.as_deref(), auth)
        .await
        .map_err(|err| match err {
            SemanticError::ModelNotFound(_) => {
                SemanticError::ModelNotFound(cfg.model_path.display().to_string())
            }
            other => other,
        })?;

    let tokenizer_target = tokenizer_storage_path(cfg)?;
    let tokenizer_path = ensure_local_file(&tokenizer_target, cfg.tokenizer_url.as_deref(), auth)
        .await
        .map_err(|err| match err {
            SemanticError::ModelNotFound(path) => SemanticError::TokenizerMissing(path),
            other => other,
        })?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

/// Determines where the tokenizer should be stored. When no explicit path is supplied we infer a
/// filename from the remote URL and place it next to the model file.
fn tokenizer_storage_path(cfg: &SemanticConfig) -> Result<PathBuf, SemanticError> {
    if let Some(path) = &cfg.tokenizer_path {
        return Ok(path.clone());
    }

    if let Some(url) = &cfg.tokenizer_url {
        let inferred_name = infer_filename_from_url(url).unwrap_or_else(|| "tokenizer.json".into());
        let base_dir = cfg
            .model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok(base_dir.join(inferred_name));
    }

    Err(SemanticError::TokenizerMissing(cfg.model_name.clone()))
}

/// Returns `target` if it already exists, otherwise downloads `remote_url` into it.
///
/// A missing file without a URL is reported as [`SemanticError::ModelNotFound`] carrying the
/// target path. Shared with the other model-backed crates of the service.
pub async fn ensure_local_file(
    target: &Path,
    remote_url: Option<&str>,
    auth_header: Option<&str>,
) -> Result<PathBuf, SemanticError> {
    if target.exists() {
        return Ok(target.to_path_buf());
    }

    if let Some(url) = remote_url {
        tracing::info!(url, target = %target.display(), "downloading model asset");
        download_to_path(target, url, auth_header).await?;
        return Ok(target.to_path_buf());
    }

    Err(SemanticError::ModelNotFound(target.display().to_string()))
}

/// Downloads `url` into `target`, creating parent directories as needed.
async fn download_to_path(
    target: &Path,
    url: &str,
    auth_header: Option<&str>,
) -> Result<(), SemanticError> {
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut request = reqwest::Client::new().get(url);
    if let Some(header) = auth_header {
        request = request.header("Authorization", header);
    }

    let response = request
        .send()
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SemanticError::Download(format!(
            "unexpected status {status} while fetching {url}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    fs::write(target, &bytes)?;
    Ok(())
}

/// Extracts a filename from the provided URL, stripping query/fragment parts.
fn infer_filename_from_url(url: &str) -> Option<String> {
    url.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.split(['?', '#']).next().unwrap_or(segment))
        .map(|segment| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_filename_without_query() {
        assert_eq!(
            infer_filename_from_url("https://hf.co/x/resolve/main/tokenizer.json?download=1"),
            Some("tokenizer.json".into())
        );
        assert_eq!(
            infer_filename_from_url("https://example.com/models/vocab.json/"),
            Some("vocab.json".into())
        );
    }

    #[test]
    fn tokenizer_path_is_inferred_next_to_model() {
        let cfg = SemanticConfig {
            model_path: PathBuf::from("/opt/models/gemma/model.onnx"),
            tokenizer_path: None,
            tokenizer_url: Some("https://example.com/tok.json".into()),
            ..Default::default()
        };
        assert_eq!(
            tokenizer_storage_path(&cfg).unwrap(),
            PathBuf::from("/opt/models/gemma/tok.json")
        );
    }

    #[test]
    fn tokenizer_without_path_or_url_is_missing() {
        let cfg = SemanticConfig {
            tokenizer_path: None,
            tokenizer_url: None,
            ..Default::default()
        };
        assert!(matches!(
            tokenizer_storage_path(&cfg),
            Err(SemanticError::TokenizerMissing(_))
        ));
    }

    #[tokio::test]
    async fn existing_file_is_used_as_is() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = ensure_local_file(file.path(), None, None).await.unwrap();
        assert_eq!(path, file.path());
    }

    #[tokio::test]
    async fn missing_model_reports_its_path() {
        let cfg = SemanticConfig {
            model_path: PathBuf::from("./missing/model.onnx"),
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            ..Default::default()
        };
        let err = resolve_model_assets(&cfg).await.unwrap_err();
        assert!(matches!(err, SemanticError::ModelNotFound(p) if p.contains("missing/model.onnx")));
    }

    #[tokio::test]
    async fn missing_tokenizer_is_tokenizer_missing() {
        let model = tempfile::NamedTempFile::new().unwrap();
        let cfg = SemanticConfig {
            model_path: model.path().to_path_buf(),
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            ..Default::default()
        };
        let err = resolve_model_assets(&cfg).await.unwrap_err();
        assert!(matches!(err, SemanticError::TokenizerMissing(_)));
    }
}
