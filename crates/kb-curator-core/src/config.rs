//! Configuration for the curation pipeline

/// Curation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Raw history is cut to this many trailing characters
    pub max_history_chars: usize,

    /// Raw history and sliced window must both reach this length
    pub min_history_chars: usize,

    /// Newest recommendation documents consulted for duplicates
    pub scan_limit: usize,

    /// Coverage ratio at or above which a candidate counts as known
    pub similarity_threshold: f64,

    /// Minimum normalized length for the verbatim substring check
    pub min_substring_chars: usize,

    /// Cap on strings collected from a hook payload
    pub max_collected_strings: usize,

    /// Per-request timeout for the analysis backend
    pub analyzer_timeout_secs: u64,

    /// Base URL of the analysis backend
    pub backend_url: String,

    /// Analyzer model as `provider/model`; the backend default when unset
    pub analyzer_model: Option<String>,
}

impl Config {
    pub const ENV_MAX_HISTORY_CHARS: &'static str = "AI_KB_MAX_HISTORY_CHARS";
    pub const ENV_MIN_HISTORY_CHARS: &'static str = "AI_KB_MIN_HISTORY_CHARS";
    pub const ENV_SCAN_LIMIT: &'static str = "AI_KB_RECOMMENDATION_SCAN_LIMIT";
    pub const ENV_ANALYZER_TIMEOUT_SEC: &'static str = "AI_KB_ANALYZER_TIMEOUT_SEC";
    pub const ENV_SIMILARITY_THRESHOLD: &'static str = "AI_KB_SIMILARITY_THRESHOLD";
    pub const ENV_BACKEND_URL: &'static str = "AI_KB_BACKEND_URL";
    pub const ENV_ANALYZER_MODEL: &'static str = "AI_KB_ANALYZER_MODEL";

    /// Set in the environment of nested analyzer runs so the hook stays quiet
    pub const ENV_INTERNAL_SENTINEL: &'static str = "AI_KB_ANALYZER_INTERNAL";

    pub fn new() -> Self {
        Self {
            max_history_chars: 120_000,
            min_history_chars: 800,
            scan_limit: 300,
            similarity_threshold: 0.55,
            min_substring_chars: 50,
            max_collected_strings: 5000,
            analyzer_timeout_secs: 45,
            backend_url: "http://127.0.0.1:4096".to_string(),
            analyzer_model: None,
        }
    }

    /// Defaults with overrides from the process environment
    pub fn from_env() -> Self {
        Self::new().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Values that do not parse keep the current setting.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        if let Some(v) = number(Self::ENV_MAX_HISTORY_CHARS) {
            self.max_history_chars = v;
        }
        if let Some(v) = number(Self::ENV_MIN_HISTORY_CHARS) {
            self.min_history_chars = v;
        }
        if let Some(v) = number(Self::ENV_SCAN_LIMIT) {
            self.scan_limit = v;
        }
        if let Some(v) = number(Self::ENV_ANALYZER_TIMEOUT_SEC) {
            self.analyzer_timeout_secs = v as u64;
        }
        if let Some(v) = lookup(Self::ENV_SIMILARITY_THRESHOLD)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
        {
            self.similarity_threshold = v;
        }
        if let Some(url) = lookup(Self::ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup(Self::ENV_ANALYZER_MODEL).filter(|v| !v.trim().is_empty()) {
            self.analyzer_model = Some(model.trim().to_string());
        }
        self
    }

    /// Whether this process was spawned by the analyzer itself
    pub fn is_internal_invocation() -> bool {
        std::env::var(Self::ENV_INTERNAL_SENTINEL)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
