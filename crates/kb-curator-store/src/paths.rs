//! Path resolution for KB documents and the recommendation queue

use std::path::{Path, PathBuf};

/// Name of the directory recommendation documents are written to
pub const RECOMMENDATIONS_DIR_NAME: &str = "kb-recommendations";

const PROJECT_HOST_DIR: &str = ".opencode";
const PROJECT_KB_PREFIX: &str = "ai-kb/";
const HOME_KB_PREFIX: &str = "~/ai-kb/";

/// Resolves standard paths relative to a project root and the user's home
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
    pub project_root: PathBuf,
}

impl Paths {
    /// Create a resolver for `project_root` using the current user's home directory
    pub fn new(project_root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::with_home(home, project_root))
    }

    /// Create a resolver with an explicit home directory
    pub fn with_home(home: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            project_root: project_root.into(),
        }
    }

    /// Global recommendation queue under the user's config home
    pub fn global_recommendation_dir(&self) -> PathBuf {
        self.home
            .join(".config")
            .join("opencode")
            .join(RECOMMENDATIONS_DIR_NAME)
    }

    /// Recommendation directory for this project.
    ///
    /// Uses the project-local queue when `<project_root>/.opencode` is a
    /// directory, otherwise the global queue.
    pub fn recommendation_dir(&self) -> PathBuf {
        let project_host = self.project_root.join(PROJECT_HOST_DIR);
        if project_host.is_dir() {
            return project_host.join(RECOMMENDATIONS_DIR_NAME);
        }
        self.global_recommendation_dir()
    }

    /// Map a KB path as written by the analyzer to a file on disk.
    ///
    /// `ai-kb/...` lives under the project root, `~/ai-kb/...` under home.
    /// Anything else has no location.
    pub fn resolve_kb_path(&self, kb_path: &str) -> Option<PathBuf> {
        let relative = kb_path.trim().replace('\\', "/");
        if relative.starts_with(PROJECT_KB_PREFIX) {
            return Some(self.project_root.join(&relative));
        }
        if relative.starts_with(HOME_KB_PREFIX) {
            return Some(self.home.join(&relative[2..]));
        }
        None
    }

    /// Read a KB document; missing, unresolvable or unreadable paths read as empty
    pub fn read_kb_file(&self, kb_path: &str) -> String {
        match self.resolve_kb_path(kb_path) {
            Some(path) => read_existing(&path),
            None => String::new(),
        }
    }
}

fn read_existing(path: &Path) -> String {
    if !path.is_file() {
        return String::new();
    }
    crate::read_lossy(path).unwrap_or_default()
}
