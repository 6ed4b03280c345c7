pub mod filter;
pub mod hooks;
pub mod status;
pub mod version;

use kb_curator_store::Paths;
use std::path::PathBuf;

/// `--directory` when given, otherwise the current directory
fn project_root(directory: Option<&str>) -> std::io::Result<PathBuf> {
    match directory.map(str::trim).filter(|d| !d.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir(),
    }
}

fn project_paths(directory: Option<&str>) -> std::io::Result<Paths> {
    Paths::new(project_root(directory)?)
}
