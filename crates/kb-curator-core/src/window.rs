//! History windowing over schema-less hook payloads

use crate::guard::SkipReason;
use crate::Config;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static COMPACTION_MARKERS: OnceLock<Vec<Regex>> = OnceLock::new();

fn compaction_markers() -> &'static [Regex] {
    COMPACTION_MARKERS.get_or_init(|| {
        [
            r"(?i)session\.compacted",
            r"(?i)(?-u:\b)precompact(?-u:\b)",
            r"(?i)(?-u:\b)compaction(?-u:\b)",
            r"(?i)(?-u:\b)compacted(?-u:\b)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

/// Collect every non-empty trimmed string in `payload`, depth-first.
///
/// Sequence items and mapping values are visited in their stored order
/// (mapping insertion order). At most `max_items` strings are returned.
pub fn collect_strings(payload: &Value, max_items: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![payload];

    while let Some(node) = stack.pop() {
        if out.len() >= max_items {
            break;
        }
        match node {
            Value::String(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            Value::Object(map) => stack.extend(map.values().rev()),
            _ => {}
        }
    }
    out
}

/// First string leaf whose dotted key path matches `pattern`, trimmed.
///
/// Each mapping's direct string children are checked in insertion order
/// before any nested value is entered; nested values are then walked
/// depth-first in insertion order. Sequence items do not add a path segment.
/// Returns an empty string when nothing matches.
pub fn find_id_by_key_pattern(payload: &Value, pattern: &Regex) -> String {
    let mut stack: Vec<(&Value, Vec<&str>)> = vec![(payload, Vec::new())];

    while let Some((node, key_path)) = stack.pop() {
        match node {
            Value::Array(items) => {
                for item in items.iter().rev() {
                    stack.push((item, key_path.clone()));
                }
            }
            Value::Object(map) => {
                let mut nested = Vec::new();
                for (key, child) in map {
                    let mut next_path = key_path.clone();
                    next_path.push(key.as_str());
                    match child {
                        Value::String(s) if pattern.is_match(&next_path.join(".")) => {
                            return s.trim().to_string();
                        }
                        Value::Object(_) | Value::Array(_) => nested.push((child, next_path)),
                        _ => {}
                    }
                }
                stack.extend(nested.into_iter().rev());
            }
            _ => {}
        }
    }
    String::new()
}

/// Strip NUL bytes, trim, and keep at most the trailing `max_chars` characters
pub fn normalize_history(raw: &str, max_chars: usize) -> String {
    let cleaned = raw.replace('\0', "");
    let cleaned = cleaned.trim();

    let total = cleaned.chars().count();
    if total <= max_chars {
        return cleaned.to_string();
    }
    match cleaned.char_indices().nth(total - max_chars) {
        Some((start, _)) => cleaned[start..].to_string(),
        None => String::new(),
    }
}

/// Suffix of `history` starting at the last compaction marker, or all of it
pub fn slice_since_last_compaction(history: &str) -> &str {
    let last = compaction_markers()
        .iter()
        .filter_map(|re| re.find_iter(history).last().map(|m| m.start()))
        .max();

    match last {
        Some(start) => &history[start..],
        None => history,
    }
}

/// Builds the history window handed to the analyzer
#[derive(Debug, Clone)]
pub struct HistoryWindower {
    max_history_chars: usize,
    min_history_chars: usize,
    max_collected_strings: usize,
}

impl HistoryWindower {
    pub fn new(config: &Config) -> Self {
        Self {
            max_history_chars: config.max_history_chars,
            min_history_chars: config.min_history_chars,
            max_collected_strings: config.max_collected_strings,
        }
    }

    /// Join all payload strings into one raw history blob
    pub fn flatten(&self, payload: &Value) -> String {
        collect_strings(payload, self.max_collected_strings).join("\n")
    }

    /// Normalize `raw`, slice it after the last compaction marker and enforce
    /// the minimum length on both the history and the window.
    pub fn window(&self, raw: &str) -> Result<String, SkipReason> {
        let history = normalize_history(raw, self.max_history_chars);
        let history_chars = history.chars().count();
        if history_chars < self.min_history_chars {
            return Err(SkipReason::HistoryTooShort {
                chars: history_chars,
            });
        }

        let window = slice_since_last_compaction(&history);
        let window_chars = window.chars().count();
        if window_chars < self.min_history_chars {
            return Err(SkipReason::WindowTooShort {
                chars: window_chars,
            });
        }
        Ok(window.to_string())
    }
}
