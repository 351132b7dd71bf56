use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use media::{NudeNetDetector, SafetyDetector, Transcriber, WhisperHttpClient};
use metrics_exporter_prometheus::PrometheusHandle;
use semantic::TextEncoder;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use triage::{ChatModel, OpenAiChatClient};

/// Outcome of loading one model at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Disabled in configuration.
    Unloaded,
    Loaded,
    Failed(String),
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Unloaded => f.write_str("unloaded"),
            LoadStatus::Loaded => f.write_str("loaded"),
            LoadStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

impl Serialize for LoadStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

enum Slot<T: ?Sized> {
    Unloaded,
    Loaded(Arc<T>),
    Failed(String),
}

/// A model the server may or may not have managed to load.
///
/// Handlers call [`Capability::get`] before doing any work; anything other than
/// [`LoadStatus::Loaded`] turns into a 503.
pub struct Capability<T: ?Sized> {
    name: &'static str,
    slot: Slot<T>,
}

impl<T: ?Sized> Capability<T> {
    pub fn loaded(name: &'static str, handle: Arc<T>) -> Self {
        Self {
            name,
            slot: Slot::Loaded(handle),
        }
    }

    pub fn unloaded(name: &'static str) -> Self {
        Self {
            name,
            slot: Slot::Unloaded,
        }
    }

    pub fn failed(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            slot: Slot::Failed(reason.into()),
        }
    }

    /// Records the result of a load attempt, logging the outcome.
    pub fn from_load<E: fmt::Display>(name: &'static str, result: Result<Arc<T>, E>) -> Self {
        match result {
            Ok(handle) => {
                tracing::info!(capability = name, "model loaded");
                Self::loaded(name, handle)
            }
            Err(err) => {
                tracing::error!(capability = name, error = %err, "model failed to load");
                Self::failed(name, err.to_string())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> LoadStatus {
        match &self.slot {
            Slot::Unloaded => LoadStatus::Unloaded,
            Slot::Loaded(_) => LoadStatus::Loaded,
            Slot::Failed(reason) => LoadStatus::Failed(reason.clone()),
        }
    }

    /// The loaded model, or [`ServerError::ModelUnavailable`].
    pub fn get(&self) -> ServerResult<Arc<T>> {
        match &self.slot {
            Slot::Loaded(handle) => Ok(handle.clone()),
            Slot::Unloaded | Slot::Failed(_) => Err(ServerError::ModelUnavailable(self.name)),
        }
    }
}

/// Shared application state, built once at startup and handed to every handler.
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    pub embedding: Capability<dyn TextEncoder>,
    pub generator: Capability<dyn ChatModel>,
    pub transcription: Capability<dyn Transcriber>,
    pub safety: Capability<dyn SafetyDetector>,

    /// Prometheus render handle when a recorder is installed
    pub metrics: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Assemble state from already-built capabilities
    pub fn new(
        config: ServerConfig,
        embedding: Capability<dyn TextEncoder>,
        generator: Capability<dyn ChatModel>,
        transcription: Capability<dyn Transcriber>,
        safety: Capability<dyn SafetyDetector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            embedding,
            generator,
            transcription,
            safety,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    /// Load every enabled model. Failures are recorded per capability; the server still starts.
    pub async fn load(config: ServerConfig) -> Self {
        let embedding = if config.embedding.enabled {
            Capability::from_load("Embedding", semantic::load_encoder(&config.embedding).await)
        } else {
            Capability::unloaded("Embedding")
        };

        let generator = if config.generator.enabled {
            let client = OpenAiChatClient::connect(config.generator.clone()).await;
            Capability::from_load(
                "Generator",
                client.map(|c| Arc::new(c) as Arc<dyn ChatModel>),
            )
        } else {
            Capability::unloaded("Generator")
        };

        let transcription = if config.transcription.enabled {
            let client = WhisperHttpClient::connect(config.transcription.clone()).await;
            Capability::from_load(
                "Whisper",
                client.map(|c| Arc::new(c) as Arc<dyn Transcriber>),
            )
        } else {
            Capability::unloaded("Whisper")
        };

        let safety = if config.safety.enabled {
            let detector = NudeNetDetector::load(&config.safety).await;
            Capability::from_load(
                "NudeNet",
                detector.map(|d| Arc::new(d) as Arc<dyn SafetyDetector>),
            )
        } else {
            Capability::unloaded("NudeNet")
        };

        Self::new(config, embedding, generator, transcription, safety)
    }

    /// Attach the Prometheus handle rendered by `GET /metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Status of every capability, in a fixed order
    pub fn capability_statuses(&self) -> Vec<(&'static str, LoadStatus)> {
        vec![
            (self.embedding.name(), self.embedding.status()),
            (self.generator.name(), self.generator.status()),
            (self.transcription.name(), self.transcription.status()),
            (self.safety.name(), self.safety.status()),
        ]
    }

    /// True when every capability is loaded
    pub fn is_ready(&self) -> bool {
        self.capability_statuses()
            .iter()
            .all(|(_, status)| *status == LoadStatus::Loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::{SemanticConfig, StubEncoder};

    fn stub() -> Arc<dyn TextEncoder> {
        Arc::new(StubEncoder::new(&SemanticConfig::default()).unwrap())
    }

    #[test]
    fn load_status_display() {
        assert_eq!(LoadStatus::Loaded.to_string(), "loaded");
        assert_eq!(LoadStatus::Unloaded.to_string(), "unloaded");
        assert_eq!(
            LoadStatus::Failed("file missing".into()).to_string(),
            "failed: file missing"
        );
        assert_eq!(
            serde_json::to_value(LoadStatus::Loaded).unwrap(),
            serde_json::json!("loaded")
        );
    }

    #[test]
    fn capability_get_requires_loaded() {
        let loaded = Capability::loaded("Embedding", stub());
        assert!(loaded.get().is_ok());

        let failed: Capability<dyn TextEncoder> = Capability::failed("Embedding", "missing");
        assert!(matches!(
            failed.get(),
            Err(ServerError::ModelUnavailable("Embedding"))
        ));

        let unloaded: Capability<dyn TextEncoder> = Capability::unloaded("Embedding");
        assert_eq!(unloaded.status(), LoadStatus::Unloaded);
        assert!(unloaded.get().is_err());
    }

    #[test]
    fn from_load_records_failure_reason() {
        let cap: Capability<dyn TextEncoder> =
            Capability::from_load("Embedding", Err::<Arc<dyn TextEncoder>, _>("no tokenizer"));
        assert_eq!(cap.status(), LoadStatus::Failed("no tokenizer".into()));
    }

    #[test]
    fn readiness_needs_every_capability() {
        let state = ServerState::new(
            ServerConfig::default(),
            Capability::loaded("Embedding", stub()),
            Capability::unloaded("Generator"),
            Capability::unloaded("Whisper"),
            Capability::unloaded("NudeNet"),
        );
        assert!(!state.is_ready());
        assert_eq!(state.capability_statuses()[0].1, LoadStatus::Loaded);
    }

    #[tokio::test]
    async fn load_marks_disabled_and_missing_models() {
        let mut config = ServerConfig::default();
        config.embedding.model_path = "./missing/model.onnx".into();
        config.embedding.tokenizer_path = Some("./missing/tokenizer.json".into());
        config.generator.enabled = false;
        config.transcription.enabled = false;
        config.safety.model_path = "./missing/320n.onnx".into();

        let state = ServerState::load(config).await;
        assert!(matches!(state.embedding.status(), LoadStatus::Failed(_)));
        assert_eq!(state.generator.status(), LoadStatus::Unloaded);
        assert_eq!(state.transcription.status(), LoadStatus::Unloaded);
        assert!(matches!(state.safety.status(), LoadStatus::Failed(_)));
    }
}
