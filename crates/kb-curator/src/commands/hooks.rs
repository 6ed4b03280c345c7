use kb_curator_analyze::{Curator, HookInvocation, OpencodeBackend, Outcome};
use kb_curator_core::{Config, CuratorState};
use kb_curator_store::Paths;
use serde::Deserialize;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The host only needs an empty acknowledgement
const HOOK_RESPONSE: &str = "{}";

/// Fields hosts use to say where the project lives
#[derive(Debug, Default, Deserialize)]
struct ProjectHints {
    #[serde(default)]
    workspace_roots: Vec<String>,
    #[serde(default)]
    directory: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
}

impl ProjectHints {
    fn from_input(input: &Value) -> Self {
        serde_json::from_value(input.clone()).unwrap_or_default()
    }

    fn root(&self) -> Option<PathBuf> {
        self.workspace_roots
            .first()
            .map(String::as_str)
            .into_iter()
            .chain(self.directory.as_deref())
            .chain(self.cwd.as_deref())
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .map(PathBuf::from)
    }
}

fn resolve_project_root(directory: Option<&str>, input: &Value) -> io::Result<PathBuf> {
    if let Some(dir) = directory.map(str::trim).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    match ProjectHints::from_input(input).root() {
        Some(root) => Ok(root),
        None => std::env::current_dir(),
    }
}

fn parse_invocation(raw: &str) -> Option<HookInvocation> {
    if raw.trim().is_empty() {
        tracing::debug!("empty hook payload");
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(document) => Some(HookInvocation::from_document(document)),
        Err(err) => {
            tracing::debug!(error = %err, "malformed hook payload");
            None
        }
    }
}

fn run_pipeline(directory: Option<&str>, invocation: &HookInvocation) -> anyhow::Result<Outcome> {
    let project_root = resolve_project_root(directory, &invocation.input)?;
    let config = Config::from_env();
    let paths = Paths::new(project_root.clone())?;
    let mut backend = OpencodeBackend::new(
        config.backend_url.as_str(),
        Duration::from_secs(config.analyzer_timeout_secs),
    )?
    .with_directory(project_root.to_string_lossy());
    if let Some(model) = &config.analyzer_model {
        backend = backend.with_model(model);
    }

    let curator = Curator::new(
        config,
        paths,
        Arc::new(backend),
        Arc::new(CuratorState::new()),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(curator.handle_compaction(invocation)))
}

fn respond() -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    let written = writeln!(stdout, "{HOOK_RESPONSE}").and_then(|_| stdout.flush());
    if let Err(err) = written {
        tracing::debug!(error = %err, "failed to write hook response");
    }
    Ok(())
}

pub fn hook_pre_compact(directory: Option<&str>) -> anyhow::Result<()> {
    // 1. Nested runs spawned by the analyzer stay silent
    if Config::is_internal_invocation() {
        tracing::debug!("internal analyzer invocation, skipping");
        return respond();
    }

    // 2. Read the hook payload from stdin
    let mut input_str = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut input_str) {
        tracing::debug!(error = %err, "failed to read hook payload");
        return respond();
    }

    // 3. Run the pipeline; nothing it does reaches the host
    if let Some(invocation) = parse_invocation(&input_str) {
        match run_pipeline(directory, &invocation) {
            Ok(outcome) => tracing::debug!(?outcome, "pre-compact hook finished"),
            Err(err) => tracing::debug!(error = %err, "pre-compact hook failed"),
        }
    }

    respond()
}
