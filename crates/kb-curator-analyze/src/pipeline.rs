//! Compaction hook pipeline: window, analyze, filter, write

use crate::backend::AnalysisBackend;
use crate::prompt::{ANALYZER_SESSION_TITLE, INTERNAL_TITLE_PREFIX};
use crate::session::run_structured_analysis;
use chrono::Utc;
use kb_curator_core::{
    collect_strings, find_id_by_key_pattern, write_recommendation, Config, CuratorState, HistoryWindower,
    NoveltyFilter, RunMetadata, SkipReason,
};
use kb_curator_store::Paths;
use regex::Regex;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

static SESSION_ID_RE: OnceLock<Regex> = OnceLock::new();
static CONVERSATION_ID_RE: OnceLock<Regex> = OnceLock::new();
static GENERATION_ID_RE: OnceLock<Regex> = OnceLock::new();
static TITLE_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn id_pattern(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

/// The two opaque values a compaction event hands to the hook
#[derive(Debug, Clone, Default)]
pub struct HookInvocation {
    pub input: Value,
    pub output: Value,
}

impl HookInvocation {
    pub fn new(input: Value, output: Value) -> Self {
        Self { input, output }
    }

    /// Split a stdin document of the form `{"input": .., "output": ..}`;
    /// any other document is taken as the input.
    pub fn from_document(document: Value) -> Self {
        match document {
            Value::Object(mut map) if map.contains_key("input") => {
                let input = map.remove("input").unwrap_or(Value::Null);
                let output = map.remove("output").unwrap_or(Value::Null);
                Self { input, output }
            }
            other => Self {
                input: other,
                output: Value::Null,
            },
        }
    }

    pub fn payload(&self) -> Value {
        json!({ "input": self.input, "output": self.output })
    }

    fn input_str(&self, key: &str) -> Option<&str> {
        self.input
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// What one invocation did. Never surfaced to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Written(PathBuf),
    Skipped(SkipReason),
    /// The backend produced no usable structured analysis
    NoAnalysis,
    /// The backend found nothing worth recommending
    NothingToRecommend,
    /// Every proposed item was already known
    NothingNovel,
    Failed(String),
}

/// Runs the curation pipeline for compaction events
pub struct Curator {
    config: Config,
    paths: Paths,
    backend: Arc<dyn AnalysisBackend>,
    state: Arc<CuratorState>,
}

impl Curator {
    pub fn new(
        config: Config,
        paths: Paths,
        backend: Arc<dyn AnalysisBackend>,
        state: Arc<CuratorState>,
    ) -> Self {
        Self {
            config,
            paths,
            backend,
            state,
        }
    }

    pub fn state(&self) -> &CuratorState {
        &self.state
    }

    /// Hook entry point. Every failure is absorbed here.
    pub async fn handle_compaction(&self, invocation: &HookInvocation) -> Outcome {
        match self.analyze_compaction_window(invocation).await {
            Ok(outcome) => {
                tracing::debug!(?outcome, "compaction analysis finished");
                outcome
            }
            Err(err) => {
                tracing::debug!(error = %err, "compaction analysis failed");
                Outcome::Failed(err.to_string())
            }
        }
    }

    async fn analyze_compaction_window(
        &self,
        invocation: &HookInvocation,
    ) -> anyhow::Result<Outcome> {
        if self.state.is_busy() {
            return Ok(Outcome::Skipped(SkipReason::Busy));
        }

        let payload = invocation.payload();
        let raw_session_id = first_id(
            &payload,
            &[
                id_pattern(&SESSION_ID_RE, r"(?i)session[_\-.]?id"),
                id_pattern(&CONVERSATION_ID_RE, r"(?i)conversation[_\-.]?id"),
            ],
        )
        .unwrap_or_else(|| "session".to_string());

        // Each hook run may be a fresh process, so the in-memory denylist
        // cannot see sessions opened by an earlier run
        if is_analyzer_traffic(&payload, self.config.max_collected_strings) {
            tracing::debug!(session_id = %raw_session_id, "payload belongs to an analyzer session");
            return Ok(Outcome::Skipped(SkipReason::InternalSession {
                session_id: raw_session_id,
            }));
        }

        let _permit = match self.state.try_begin(&raw_session_id) {
            Ok(permit) => permit,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        let windower = HistoryWindower::new(&self.config);
        let raw_history = self.raw_history(invocation, &payload, &windower);
        let window = match windower.window(&raw_history) {
            Ok(window) => window,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };
        let window_chars = window.chars().count();
        tracing::debug!(session_id = %raw_session_id, window_chars, "analyzing history window");

        let Some(analysis) =
            run_structured_analysis(Arc::clone(&self.backend), &self.state, &window).await
        else {
            return Ok(Outcome::NoAnalysis);
        };
        if !analysis.should_recommend {
            return Ok(Outcome::NothingToRecommend);
        }

        let out_dir = self.paths.recommendation_dir();
        let filter = NoveltyFilter::from_dir(&self.paths, &out_dir, &self.config);
        let filtered = filter.filter(analysis);
        if !filtered.should_recommend {
            return Ok(Outcome::NothingNovel);
        }

        let raw_generation_id = first_id(
            &payload,
            &[id_pattern(&GENERATION_ID_RE, r"(?i)generation[_\-.]?id")],
        )
        .unwrap_or_else(|| "generation".to_string());
        let mut meta = RunMetadata::new(
            Utc::now(),
            &raw_session_id,
            &raw_generation_id,
            window_chars,
        );
        if let Some(hook) = invocation.input_str("hook_event_name") {
            meta = meta.with_source_hook(hook);
        }

        let path = write_recommendation(&out_dir, &meta, &filtered)?;
        tracing::info!(path = %path.display(), "wrote KB recommendation");
        Ok(Outcome::Written(path))
    }

    /// Transcript file named by the payload, else every payload string joined
    fn raw_history(
        &self,
        invocation: &HookInvocation,
        payload: &Value,
        windower: &HistoryWindower,
    ) -> String {
        if let Some(transcript) = invocation.input_str("transcript_path") {
            match kb_curator_store::read_lossy(std::path::Path::new(transcript)) {
                Ok(text) => return text,
                Err(err) => {
                    tracing::debug!(path = transcript, error = %err, "transcript unreadable, using payload");
                }
            }
        }
        windower.flatten(payload)
    }
}

/// True when the payload names the analyzer's own session: a `title` field
/// with the internal prefix, or the analyzer title anywhere
fn is_analyzer_traffic(payload: &Value, max_items: usize) -> bool {
    let title = find_id_by_key_pattern(payload, id_pattern(&TITLE_KEY_RE, r"(?i)(^|\.)title$"));
    if title.trim_start().starts_with(INTERNAL_TITLE_PREFIX) {
        return true;
    }
    collect_strings(payload, max_items)
        .iter()
        .any(|s| s == ANALYZER_SESSION_TITLE)
}

fn first_id(payload: &Value, patterns: &[&Regex]) -> Option<String> {
    patterns
        .iter()
        .map(|re| find_id_by_key_pattern(payload, re))
        .find(|id| !id.is_empty())
}
