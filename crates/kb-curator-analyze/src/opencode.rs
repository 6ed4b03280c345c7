//! HTTP backend speaking the opencode server session API

use crate::backend::{AnalysisBackend, AnalyzeError, PromptRequest};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for `POST /session`, `POST /session/{id}/message` and `DELETE /session/{id}`
#[derive(Debug, Clone)]
pub struct OpencodeBackend {
    client: reqwest::Client,
    base_url: String,
    directory: Option<String>,
    model: Option<(String, String)>,
}

impl OpencodeBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalyzeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            directory: None,
            model: None,
        })
    }

    /// Scope sessions to a project directory on the server
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Pin prompts to a `provider/model`; other shapes keep the server default
    pub fn with_model(mut self, model: &str) -> Self {
        match model.trim().split_once('/') {
            Some((provider, id)) if !provider.is_empty() && !id.is_empty() => {
                self.model = Some((provider.to_string(), id.to_string()));
            }
            _ => tracing::debug!(model, "ignoring analyzer model without a provider"),
        }
        self
    }

    fn message_body(&self, request: &PromptRequest) -> Value {
        let mut body = json!({
            "parts": [{ "type": "text", "text": request.text }],
            "format": {
                "type": "json_schema",
                "schema": request.schema,
                "retryCount": request.retry_count,
            },
        });
        if let Some((provider, id)) = &self.model {
            body["model"] = json!({ "providerID": provider, "modelID": id });
        }
        body
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, AnalyzeError> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AnalyzeError::InvalidUrl(e.to_string()))?;
        if let Some(dir) = &self.directory {
            url.query_pairs_mut().append_pair("directory", dir);
        }
        Ok(url)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, AnalyzeError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalyzeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AnalysisBackend for OpencodeBackend {
    async fn create_session(&self, title: &str) -> Result<String, AnalyzeError> {
        let response = self
            .client
            .post(self.url("/session")?)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        let session = body.get("data").unwrap_or(&body);
        session
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(AnalyzeError::MissingSessionId)
    }

    async fn prompt(
        &self,
        session_id: &str,
        request: &PromptRequest,
    ) -> Result<Value, AnalyzeError> {
        let body = self.message_body(request);
        let response = self
            .client
            .post(self.url(&format!("/session/{}/message", session_id))?)
            .json(&body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AnalyzeError> {
        let response = self
            .client
            .delete(self.url(&format!("/session/{}", session_id))?)
            .send()
            .await?;
        Self::read_json(response).await?;
        Ok(())
    }
}
