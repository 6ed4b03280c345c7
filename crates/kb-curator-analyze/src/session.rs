//! Ephemeral analyzer sessions with guaranteed teardown

use crate::backend::{AnalysisBackend, AnalyzeError, PromptRequest};
use crate::extract::extract_structured;
use crate::prompt::{build_analyzer_prompt, build_schema, ANALYZER_SESSION_TITLE};
use kb_curator_core::{AnalysisResult, CuratorState};
use serde_json::Value;
use std::sync::Arc;

/// A backend session owned by the analyzer for the span of one request.
///
/// While open, its id is registered as internal so hook invocations caused
/// by the analyzer's own traffic are ignored. A session dropped before
/// [`EphemeralSession::close`] is deleted on a detached task.
pub struct EphemeralSession<'a> {
    backend: Arc<dyn AnalysisBackend>,
    state: &'a CuratorState,
    id: String,
    closed: bool,
}

impl<'a> EphemeralSession<'a> {
    pub async fn open(
        backend: Arc<dyn AnalysisBackend>,
        state: &'a CuratorState,
        title: &str,
    ) -> Result<Self, AnalyzeError> {
        let id = backend.create_session(title).await?;
        state.register_internal(&id);
        Ok(Self {
            backend,
            state,
            id,
            closed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn prompt(&self, request: &PromptRequest) -> Result<Value, AnalyzeError> {
        self.backend.prompt(&self.id, request).await
    }

    /// Delete the session. Failures are logged and dropped.
    pub async fn close(mut self) {
        if let Err(err) = self.backend.delete_session(&self.id).await {
            tracing::debug!(session_id = %self.id, error = %err, "analyzer session cleanup failed");
        }
        self.state.unregister_internal(&self.id);
        self.closed = true;
    }

    /// Open a session, send `request`, and close the session on every path
    pub async fn run(
        backend: Arc<dyn AnalysisBackend>,
        state: &'a CuratorState,
        title: &str,
        request: &PromptRequest,
    ) -> Result<Value, AnalyzeError> {
        let session = Self::open(backend, state, title).await?;
        let response = session.prompt(request).await;
        session.close().await;
        response
    }
}

impl Drop for EphemeralSession<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.state.unregister_internal(&self.id);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(session_id = %self.id, "analyzer session dropped outside a runtime, not deleted");
            return;
        };
        let backend = Arc::clone(&self.backend);
        let session_id = std::mem::take(&mut self.id);
        tracing::debug!(session_id = %session_id, "analyzer session abandoned, deleting in background");
        handle.spawn(async move {
            if let Err(err) = backend.delete_session(&session_id).await {
                tracing::debug!(session_id = %session_id, error = %err, "background session cleanup failed");
            }
        });
    }
}

/// Ask the backend for a structured analysis of `window`.
///
/// Every failure, including a response without a usable structured
/// object, yields `None`.
pub async fn run_structured_analysis(
    backend: Arc<dyn AnalysisBackend>,
    state: &CuratorState,
    window: &str,
) -> Option<AnalysisResult> {
    let request = PromptRequest::new(build_analyzer_prompt(window), build_schema());
    match EphemeralSession::run(backend, state, ANALYZER_SESSION_TITLE, &request).await {
        Ok(response) => {
            let analysis = extract_structured(&response).and_then(AnalysisResult::from_value);
            if analysis.is_none() {
                tracing::debug!("analyzer response carried no structured analysis");
            }
            analysis
        }
        Err(err) => {
            tracing::debug!(error = %err, "structured analysis unavailable");
            None
        }
    }
}
