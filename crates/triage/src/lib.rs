//! Issue triage for the civic AI service.
//!
//! A free-text issue report goes to a generative chat model with a fixed prompt asking for a
//! JSON object (`summary`, `category`, `urgency`). The reply is untrusted: the extractor pulls
//! out what it can and falls back to safe defaults for the rest, so malformed output never
//! becomes an error. Only a failing model call does.
//!
//! ```no_run
//! use triage::{analyze_issue, ChatConfig, OpenAiChatClient};
//!
//! # async fn run() -> Result<(), triage::TriageError> {
//! let client = OpenAiChatClient::connect(ChatConfig::default()).await?;
//! let analysis = analyze_issue(&client, "No water supply for 3 days.", None).await?;
//! println!("{} / {} / {}", analysis.summary, analysis.category, analysis.urgency);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

mod client;
mod extract;
mod prompt;

pub use crate::client::{ChatModel, OpenAiChatClient};
pub use crate::config::ChatConfig;
pub use crate::error::TriageError;
pub use crate::extract::{
    extract_issue_analysis, fallback_summary, IssueAnalysis, Urgency, FALLBACK_CATEGORY,
    FALLBACK_SUMMARY_CHARS, REASONING_MARKER,
};
pub use crate::prompt::{build_issue_prompt, ChatMessage, Role, DEFAULT_CATEGORIES};

/// Prompts `model` about `description` and extracts the structured triage from its reply.
pub async fn analyze_issue(
    model: &dyn ChatModel,
    description: &str,
    categories: Option<&str>,
) -> Result<IssueAnalysis, TriageError> {
    let messages = build_issue_prompt(description, categories);
    let raw = model.complete(&messages).await?;
    tracing::debug!(model = model.model_name(), chars = raw.len(), "issue analysis completion received");
    Ok(extract_issue_analysis(&raw, description))
}
