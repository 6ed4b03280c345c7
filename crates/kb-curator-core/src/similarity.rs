//! Text normalization, tokenization and coverage-based similarity

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"[a-z0-9_]{3,}").expect("valid regex"))
}

/// Collapse whitespace runs to one space, trim and lowercase
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Distinct `[a-z0-9_]` runs of length >= 3 from the normalized text
pub fn tokenize(text: &str) -> HashSet<String> {
    token_re()
        .find_iter(&normalize(text))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Fraction of `candidate`'s tokens also present in `base`.
///
/// Zero when either side has no tokens.
pub fn coverage_ratio(base: &str, candidate: &str) -> f64 {
    token_coverage(&tokenize(base), &tokenize(candidate))
}

fn token_coverage(base_tokens: &HashSet<String>, candidate_tokens: &HashSet<String>) -> f64 {
    if base_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }
    let shared = candidate_tokens
        .iter()
        .filter(|t| base_tokens.contains(*t))
        .count();
    shared as f64 / candidate_tokens.len().max(1) as f64
}

/// A base text normalized and tokenized once, for repeated comparisons
#[derive(Debug, Clone)]
pub struct PreparedText {
    normalized: String,
    tokens: HashSet<String>,
}

impl PreparedText {
    pub fn new(text: &str) -> Self {
        let normalized = normalize(text);
        let tokens = tokenize(&normalized);
        Self { normalized, tokens }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// [`Similarity::contains_or_similar`] with the default thresholds
pub fn contains_or_similar(base: &str, candidate: &str) -> bool {
    Similarity::default().contains_or_similar(base, candidate)
}

/// Decides whether a candidate text is already represented in a base text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// Coverage ratio at or above which the candidate is considered covered
    pub threshold: f64,
    /// Verbatim containment only counts for candidates at least this long
    pub min_substring_chars: usize,
}

impl Similarity {
    pub fn new(threshold: f64, min_substring_chars: usize) -> Self {
        Self {
            threshold,
            min_substring_chars,
        }
    }

    /// True when the normalized candidate appears verbatim in the normalized
    /// base (and is long enough), or when its token coverage reaches the threshold.
    pub fn contains_or_similar(&self, base: &str, candidate: &str) -> bool {
        self.covers(&PreparedText::new(base), candidate)
    }

    /// [`Similarity::contains_or_similar`] against a prepared base
    pub fn covers(&self, base: &PreparedText, candidate: &str) -> bool {
        let candidate_norm = normalize(candidate);
        if candidate_norm.chars().count() >= self.min_substring_chars
            && base.normalized.contains(&candidate_norm)
        {
            return true;
        }
        token_coverage(&base.tokens, &tokenize(&candidate_norm)) >= self.threshold
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Self::new(0.55, 50)
    }
}

impl From<&crate::Config> for Similarity {
    fn from(config: &crate::Config) -> Self {
        Self::new(config.similarity_threshold, config.min_substring_chars)
    }
}
