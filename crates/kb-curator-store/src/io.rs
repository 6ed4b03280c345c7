//! Atomic writes and recommendation corpus loading

use std::path::Path;

/// Write data atomically using temp file + rename
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(temp_path, path)?;
    Ok(())
}

/// Read a file as UTF-8, replacing invalid sequences
pub fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Markdown filenames in `dir`, sorted. A missing directory lists nothing.
///
/// Filenames start with a sortable timestamp, so lexical order is
/// chronological.
pub fn markdown_file_names(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".md"))
        .collect();
    names.sort();
    names
}

/// Load the newest `limit` markdown documents from `dir`.
///
/// Unreadable files are skipped; a missing directory yields an empty corpus.
pub fn load_recent_markdown(dir: &Path, limit: usize) -> Vec<String> {
    let names = markdown_file_names(dir);
    let skip = names.len().saturating_sub(limit);
    let mut docs = Vec::with_capacity(names.len() - skip);
    for name in names.into_iter().skip(skip) {
        match read_lossy(&dir.join(&name)) {
            Ok(doc) => docs.push(doc),
            Err(err) => {
                tracing::debug!(file = %name, error = %err, "skipping unreadable recommendation");
            }
        }
    }
    docs
}
