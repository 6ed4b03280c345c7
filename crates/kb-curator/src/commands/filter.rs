use anyhow::{anyhow, Context};
use kb_curator_analyze::{extract_structured, parse_assistant_text};
use kb_curator_core::{AnalysisResult, Config, NoveltyFilter};
use kb_curator_store::Paths;

/// Decode an analysis from a file holding either the analysis itself or a
/// saved backend response
fn load_analysis(content: &str) -> Option<AnalysisResult> {
    let value = parse_assistant_text(content)?;
    let structured = extract_structured(&value).unwrap_or(value);
    AnalysisResult::from_value(structured)
}

fn filter_analysis(paths: &Paths, config: &Config, analysis: AnalysisResult) -> AnalysisResult {
    let dir = paths.recommendation_dir();
    let filter = NoveltyFilter::from_dir(paths, &dir, config);
    let before = analysis.recommendations.len() + analysis.index_updates.len();
    let filtered = filter.filter(analysis);
    tracing::debug!(
        corpus = filter.corpus_len(),
        before,
        after = filtered.recommendations.len() + filtered.index_updates.len(),
        "filtered analysis"
    );
    filtered
}

pub fn run(analysis_file: &str, directory: Option<&str>) -> anyhow::Result<()> {
    let content = kb_curator_store::read_lossy(std::path::Path::new(analysis_file))
        .with_context(|| format!("reading {analysis_file}"))?;
    let analysis = load_analysis(&content)
        .ok_or_else(|| anyhow!("{analysis_file} does not contain a structured analysis"))?;

    let paths = super::project_paths(directory)?;
    let config = Config::from_env();
    let filtered = filter_analysis(&paths, &config, analysis);

    println!("{}", serde_json::to_string_pretty(&filtered)?);
    Ok(())
}
