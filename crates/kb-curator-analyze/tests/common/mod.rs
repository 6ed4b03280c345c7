#![allow(dead_code)]

use async_trait::async_trait;
use kb_curator_analyze::{AnalysisBackend, AnalyzeError, PromptRequest};
use kb_curator_core::Config;
use kb_curator_store::Paths;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// In-memory backend that records every call
#[derive(Default)]
pub struct MockBackend {
    pub response: Mutex<Value>,
    pub missing_session_id: bool,
    pub fail_prompt: bool,
    pub fail_delete: bool,
    pub gate: Option<Arc<Notify>>,
    pub prompt_delay: Option<Duration>,
    pub creates: AtomicUsize,
    pub prompts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub last_prompt: Mutex<Option<PromptRequest>>,
}

impl MockBackend {
    pub fn answering(analysis: Value) -> Self {
        Self {
            response: Mutex::new(json!({ "info": { "structured_output": analysis }, "parts": [] })),
            ..Default::default()
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    async fn create_session(&self, _title: &str) -> Result<String, AnalyzeError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.missing_session_id {
            return Err(AnalyzeError::MissingSessionId);
        }
        Ok(format!("ses_mock_{}", n))
    }

    async fn prompt(
        &self,
        _session_id: &str,
        request: &PromptRequest,
    ) -> Result<Value, AnalyzeError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.clone());
        if let Some(delay) = self.prompt_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_prompt {
            return Err(AnalyzeError::Status {
                status: 500,
                body: "model overloaded".to_string(),
            });
        }
        Ok(self.response.lock().unwrap().clone())
    }

    async fn delete_session(&self, _session_id: &str) -> Result<(), AnalyzeError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(AnalyzeError::Status {
                status: 404,
                body: "gone".to_string(),
            });
        }
        Ok(())
    }
}

/// Home and project directories; the project has a `.opencode` queue
pub struct Workspace {
    pub home: TempDir,
    pub project: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::create_dir_all(project.path().join(".opencode")).unwrap();
        Self { home, project }
    }

    pub fn paths(&self) -> Paths {
        Paths::with_home(self.home.path(), self.project.path())
    }

    pub fn recommendation_files(&self) -> Vec<std::path::PathBuf> {
        let dir = self.paths().recommendation_dir();
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
                    .collect()
            })
            .unwrap_or_default();
        files.sort();
        files
    }
}

pub fn config() -> Config {
    Config::new()
}

/// About 1500 characters of dialog without compaction markers
pub fn long_history() -> String {
    let turns = [
        "user: the integration tests keep failing on CI but pass locally",
        "assistant: the tests share HOME and race on the plugin state file",
        "user: so we should serialize every test that touches the home directory",
        "assistant: yes, mark them with serial_test and clean the state file first",
    ];
    let mut text = String::new();
    while text.len() < 1500 {
        for turn in turns {
            text.push_str(turn);
            text.push('\n');
        }
    }
    text
}

pub fn novel_analysis() -> Value {
    json!({
        "should_recommend": true,
        "confidence": "high",
        "conversation_summary": "Diagnosed CI-only test failures caused by shared HOME state.",
        "recommendations": [{
            "action": "create_new",
            "target_path": "~/ai-kb/rules/testing.md",
            "reason": "Flaky tests recurred across several turns",
            "suggested_content": "Serialize tests that touch the home directory with serial_test and reset plugin state before each run",
            "link_commands": ["~/ai-kb/commands/run-tests.md"]
        }],
        "index_updates": [{
            "index_path": "~/ai-kb/rules/INDEX.md",
            "entry": "- testing.md: isolation rules for tests sharing HOME",
            "reason": "New rule file"
        }]
    })
}
