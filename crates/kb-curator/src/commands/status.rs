use kb_curator_core::Config;
use kb_curator_store::Paths;
use serde_json::json;

fn status_report(paths: &Paths, config: &Config) -> serde_json::Value {
    let dir = paths.recommendation_dir();
    let documents = kb_curator_store::markdown_file_names(&dir);

    json!({
        "project_root": paths.project_root.display().to_string(),
        "recommendation_dir": dir.display().to_string(),
        "documents": documents.len(),
        "newest": documents.last(),
        "internal": Config::is_internal_invocation(),
        "config": {
            "backend_url": config.backend_url,
            "analyzer_model": config.analyzer_model,
            "analyzer_timeout_secs": config.analyzer_timeout_secs,
            "max_history_chars": config.max_history_chars,
            "min_history_chars": config.min_history_chars,
            "scan_limit": config.scan_limit,
            "similarity_threshold": config.similarity_threshold,
        },
    })
}

pub fn run(directory: Option<&str>) -> anyhow::Result<()> {
    let paths = super::project_paths(directory)?;
    let config = Config::from_env();
    println!("{}", status_report(&paths, &config));
    Ok(())
}
