//! Structured analysis types exchanged with the analysis backend

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// Index file an index update targets when the analyzer names none
pub const DEFAULT_INDEX_PATH: &str = "~/ai-kb/rules/INDEX.md";

/// Analyzer confidence in its recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
    #[default]
    UpdateExisting,
    CreateNew,
}

impl RecommendationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationAction::UpdateExisting => "update_existing",
            RecommendationAction::CreateNew => "create_new",
        }
    }
}

/// A proposed change to a KB document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: RecommendationAction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggested_content: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub link_commands: Vec<String>,
}

/// A proposed entry for a KB index file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexUpdate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub index_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entry: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
}

impl IndexUpdate {
    /// `index_path`, or the canonical index when blank
    pub fn effective_index_path(&self) -> &str {
        let trimmed = self.index_path.trim();
        if trimmed.is_empty() {
            DEFAULT_INDEX_PATH
        } else {
            trimmed
        }
    }
}

/// Structured result produced by the analysis backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub should_recommend: bool,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conversation_summary: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub index_updates: Vec<IndexUpdate>,
}

impl AnalysisResult {
    /// Decode a structured payload; only JSON objects are analyses
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(result) => Some(result),
            Err(err) => {
                tracing::debug!(error = %err, "structured payload is not an analysis");
                None
            }
        }
    }

    pub fn has_items(&self) -> bool {
        !self.recommendations.is_empty() || !self.index_updates.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sequence whose malformed items are dropped instead of failing the whole payload
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
