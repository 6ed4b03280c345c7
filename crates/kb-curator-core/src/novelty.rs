//! Duplicate suppression against the KB and previously emitted recommendations

use crate::similarity::{PreparedText, Similarity};
use crate::{AnalysisResult, Config, IndexUpdate, Recommendation};
use kb_curator_store::Paths;
use std::path::Path;

/// Source of KB document contents, keyed by the path the analyzer wrote
pub trait KbReader {
    /// Document text, or empty when the path has no readable document
    fn read_kb_file(&self, kb_path: &str) -> String;
}

impl KbReader for Paths {
    fn read_kb_file(&self, kb_path: &str) -> String {
        Paths::read_kb_file(self, kb_path)
    }
}

/// Why an item was judged already known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageReason {
    /// No path, content or reason to act on
    Degenerate,
    /// The targeted KB document already says it
    KbDocument,
    /// A prior recommendation for the same path already said it
    SameTargetRecommendation,
    /// Some prior recommendation said it, whatever its path
    PriorRecommendation,
}

struct ExistingDoc {
    lowered: String,
    prepared: PreparedText,
}

/// Drops recommendations and index updates that are already captured
pub struct NoveltyFilter<'a> {
    kb: &'a dyn KbReader,
    docs: Vec<ExistingDoc>,
    similarity: Similarity,
}

impl<'a> NoveltyFilter<'a> {
    pub fn new(kb: &'a dyn KbReader, existing_docs: Vec<String>, similarity: Similarity) -> Self {
        let docs = existing_docs
            .into_iter()
            .map(|doc| ExistingDoc {
                lowered: doc.to_lowercase(),
                prepared: PreparedText::new(&doc),
            })
            .collect();
        Self {
            kb,
            docs,
            similarity,
        }
    }

    /// Filter backed by the newest `scan_limit` documents in `recommendation_dir`
    pub fn from_dir(kb: &'a dyn KbReader, recommendation_dir: &Path, config: &Config) -> Self {
        let docs = kb_curator_store::load_recent_markdown(recommendation_dir, config.scan_limit);
        tracing::debug!(
            dir = %recommendation_dir.display(),
            documents = docs.len(),
            "loaded recommendation corpus"
        );
        Self::new(kb, docs, Similarity::from(config))
    }

    pub fn corpus_len(&self) -> usize {
        self.docs.len()
    }

    /// Keep only novel items and recompute `should_recommend`
    pub fn filter(&self, analysis: AnalysisResult) -> AnalysisResult {
        let AnalysisResult {
            confidence,
            conversation_summary,
            recommendations,
            index_updates,
            ..
        } = analysis;

        let recommendations: Vec<Recommendation> = recommendations
            .into_iter()
            .filter(|rec| match self.recommendation_coverage(rec) {
                Some(reason) => {
                    tracing::debug!(target_path = %rec.target_path, ?reason, "dropping known recommendation");
                    false
                }
                None => true,
            })
            .collect();

        let index_updates: Vec<IndexUpdate> = index_updates
            .into_iter()
            .filter(|update| match self.index_update_coverage(update) {
                Some(reason) => {
                    tracing::debug!(index_path = %update.effective_index_path(), ?reason, "dropping known index update");
                    false
                }
                None => true,
            })
            .collect();

        AnalysisResult {
            should_recommend: !recommendations.is_empty() || !index_updates.is_empty(),
            confidence,
            conversation_summary,
            recommendations,
            index_updates,
        }
    }

    /// Why `rec` is already covered, if it is
    pub fn recommendation_coverage(&self, rec: &Recommendation) -> Option<CoverageReason> {
        let target_path = rec.target_path.trim();
        let suggested = rec.suggested_content.trim();
        let reason = rec.reason.trim();
        if target_path.is_empty() && suggested.is_empty() && reason.is_empty() {
            return Some(CoverageReason::Degenerate);
        }

        let target_doc = self.kb.read_kb_file(target_path);
        if !target_doc.is_empty() {
            let prepared = PreparedText::new(&target_doc);
            if self.any_covered(&prepared, &[suggested, reason]) {
                return Some(CoverageReason::KbDocument);
            }
        }

        self.prior_coverage(target_path, &[suggested, reason])
    }

    /// Why `update` is already covered, if it is.
    ///
    /// The index file itself is only checked for the entry text; prior
    /// recommendations are checked for both entry and reason.
    pub fn index_update_coverage(&self, update: &IndexUpdate) -> Option<CoverageReason> {
        let index_path = update.effective_index_path();
        let entry = update.entry.trim();
        let reason = update.reason.trim();
        if entry.is_empty() && reason.is_empty() {
            return Some(CoverageReason::Degenerate);
        }

        let index_doc = self.kb.read_kb_file(index_path);
        if !index_doc.is_empty() && self.any_covered(&PreparedText::new(&index_doc), &[entry]) {
            return Some(CoverageReason::KbDocument);
        }

        self.prior_coverage(index_path, &[entry, reason])
    }

    fn prior_coverage(&self, path: &str, candidates: &[&str]) -> Option<CoverageReason> {
        let quoted = format!("`{}`", path.to_lowercase());
        for doc in &self.docs {
            if !self.any_covered(&doc.prepared, candidates) {
                continue;
            }
            if !path.is_empty() && doc.lowered.contains(&quoted) {
                return Some(CoverageReason::SameTargetRecommendation);
            }
            return Some(CoverageReason::PriorRecommendation);
        }
        None
    }

    fn any_covered(&self, base: &PreparedText, candidates: &[&str]) -> bool {
        candidates
            .iter()
            .filter(|c| !c.is_empty())
            .any(|c| self.similarity.covers(base, c))
    }
}
