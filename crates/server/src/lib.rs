//! Civic AI Server - HTTP API for the civic AI service
//!
//! Exposes the model-backed capabilities of `civic-ai` over HTTP:
//!
//! - **Embeddings**: unit-length text embeddings and label classification
//! - **Issue triage**: summary, category and urgency for an issue report
//! - **Media**: audio transcription and image safety checks on uploads
//! - **Health & Metrics**: liveness, per-model readiness and Prometheus metrics
//!
//! Every model is loaded once at startup. A model that fails to load does not stop the server;
//! its endpoints answer 503 and `/ready` reports the reason.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Per-model load status
//! - `GET /metrics` - Prometheus metrics
//! - `POST /analyze` - `{input_text}` → `{embedding}`
//! - `POST /classify` - `{text, candidate_labels}` → `{best_label, score, scores}`
//! - `POST /analyze-issue` - `{description, categories?}` → `{summary, category, urgency}`
//! - `POST /transcribe` - multipart `file` → `{filename, text}`
//! - `POST /classify-image` - multipart `image` → `{status, detections}`
//!
//! Errors are `{"detail": "...", "code": "..."}` with 503 for unloaded models, 400 for invalid
//! input and 500 for inference failures.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::{Capability, LoadStatus, ServerState};
