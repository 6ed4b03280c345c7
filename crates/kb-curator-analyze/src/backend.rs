//! Analysis backend abstraction

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("backend created a session without an id")]
    MissingSessionId,
}

/// One prompt with a structured-output directive
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub text: String,
    pub schema: Value,
    /// Retries the backend may spend on output that violates the schema
    pub retry_count: u32,
}

impl PromptRequest {
    pub fn new(text: impl Into<String>, schema: Value) -> Self {
        Self {
            text: text.into(),
            schema,
            retry_count: 1,
        }
    }
}

/// A conversational backend able to host short-lived analysis sessions
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Create a named session and return its id
    async fn create_session(&self, title: &str) -> Result<String, AnalyzeError>;

    /// Send one prompt and return the raw response payload
    async fn prompt(&self, session_id: &str, request: &PromptRequest)
        -> Result<Value, AnalyzeError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), AnalyzeError>;
}
