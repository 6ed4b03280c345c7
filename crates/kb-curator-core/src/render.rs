//! Markdown rendering and persistence of recommendation documents

use crate::{AnalysisResult, DEFAULT_INDEX_PATH};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

const SOURCE_HOOK: &str = "opencode plugin experimental.session.compacting";
const ANALYZER: &str = "opencode structured output";

/// Replace runs of characters outside `[A-Za-z0-9._-]` with `-`
pub fn slug(value: &str, fallback: &str) -> String {
    let re = SLUG_RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9._-]+").expect("valid regex"));
    let replaced = re.replace_all(value.trim(), "-");
    let trimmed = replaced.trim_matches('-');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Identity and provenance of one recommendation document
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub generation_id: String,
    pub history_chars: usize,
    pub source_hook: String,
}

impl RunMetadata {
    /// Metadata with slugged identifiers
    pub fn new(
        timestamp: DateTime<Utc>,
        raw_session_id: &str,
        raw_generation_id: &str,
        history_chars: usize,
    ) -> Self {
        Self {
            timestamp,
            session_id: slug(raw_session_id, "session"),
            generation_id: slug(raw_generation_id, "generation"),
            history_chars,
            source_hook: SOURCE_HOOK.to_string(),
        }
    }

    pub fn with_source_hook(mut self, source_hook: impl Into<String>) -> Self {
        self.source_hook = source_hook.into();
        self
    }
}

/// `<YYYYmmdd-HHMMSS>-<session>-<generation>.md`
pub fn recommendation_file_name(meta: &RunMetadata) -> String {
    format!(
        "{}-{}-{}.md",
        meta.timestamp.format("%Y%m%d-%H%M%S"),
        meta.session_id,
        meta.generation_id
    )
}

pub fn render_markdown(meta: &RunMetadata, analysis: &AnalysisResult) -> String {
    let confidence = analysis.confidence.map_or("unknown", |c| c.as_str());
    let summary = analysis.conversation_summary.trim();

    let mut lines = vec![
        "# KB Enrichment Recommendation".to_string(),
        String::new(),
        format!(
            "- Generated: `{}`",
            meta.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        format!("- Source hook: `{}`", meta.source_hook),
        format!("- Analyzer: `{}`", ANALYZER),
        "- Scope: `history window pending compaction (since previous compaction, or full history for first compaction)`".to_string(),
        format!("- Session: `{}`", meta.session_id),
        format!("- Generation: `{}`", meta.generation_id),
        format!("- History size: `{}` chars", meta.history_chars),
        format!("- Confidence: `{}`", confidence),
    ];

    if !summary.is_empty() {
        lines.extend([
            String::new(),
            "## Conversation Summary".to_string(),
            String::new(),
            summary.to_string(),
        ]);
    }

    lines.push(String::new());
    lines.push("## Recommendations".to_string());
    for rec in &analysis.recommendations {
        lines.push(format!(
            "- **{}** `{}`",
            rec.action.as_str(),
            rec.target_path.trim()
        ));
        let reason = rec.reason.trim();
        if !reason.is_empty() {
            lines.push(format!("  - Reason: {}", reason));
        }
        let suggested = rec.suggested_content.trim();
        if !suggested.is_empty() {
            lines.push(format!("  - Suggested content: {}", suggested));
        }
        let links: Vec<&str> = rec
            .link_commands
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if !links.is_empty() {
            lines.push("  - Link command docs:".to_string());
            for link in links {
                lines.push(format!("    - `{}`", link));
            }
        }
    }

    lines.push(String::new());
    lines.push("## Index Updates".to_string());
    for update in &analysis.index_updates {
        lines.push(format!("- `{}`", update.effective_index_path()));
        let entry = update.entry.trim();
        if !entry.is_empty() {
            lines.push(format!("  - Entry: {}", entry));
        }
        let reason = update.reason.trim();
        if !reason.is_empty() {
            lines.push(format!("  - Reason: {}", reason));
        }
    }

    lines.extend([
        String::new(),
        "## Next Action".to_string(),
        String::new(),
        format!(
            "- Apply validated KB updates, then maintain `{}` and command references.",
            DEFAULT_INDEX_PATH
        ),
    ]);

    let mut body = lines.join("\n");
    body.push('\n');
    body
}

/// Render and atomically write a recommendation document into `dir`
pub fn write_recommendation(
    dir: &Path,
    meta: &RunMetadata,
    analysis: &AnalysisResult,
) -> std::io::Result<PathBuf> {
    let path = dir.join(recommendation_file_name(meta));
    let body = render_markdown(meta, analysis);
    kb_curator_store::atomic_write(&path, body.as_bytes())?;
    Ok(path)
}
