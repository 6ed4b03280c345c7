//! Novelty filtering for post-turn KB curation

mod config;
mod guard;
mod novelty;
mod render;
mod similarity;
mod types;
mod window;

pub use config::Config;
pub use guard::{AnalysisPermit, CuratorState, SkipReason};
pub use novelty::{CoverageReason, KbReader, NoveltyFilter};
pub use render::{
    recommendation_file_name, render_markdown, slug, write_recommendation, RunMetadata,
};
pub use similarity::{
    contains_or_similar, coverage_ratio, normalize, tokenize, PreparedText, Similarity,
};
pub use types::{
    AnalysisResult, Confidence, IndexUpdate, Recommendation, RecommendationAction,
    DEFAULT_INDEX_PATH,
};
pub use window::{
    collect_strings, find_id_by_key_pattern, normalize_history, slice_since_last_compaction,
    HistoryWindower,
};
