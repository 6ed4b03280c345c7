//! Locating the structured analysis inside a backend response

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static FENCED_JSON_RE: OnceLock<Regex> = OnceLock::new();

/// Structured payload of a prompt response.
///
/// Prefers `info.structured_output` / `info.structured`; otherwise scans the
/// response's text parts for an analysis object. Only objects qualify.
pub fn extract_structured(response: &Value) -> Option<Value> {
    let payload = response.get("data").unwrap_or(response);
    let info = payload.get("info");
    let structured = info
        .and_then(|i| i.get("structured_output"))
        .filter(|v| !v.is_null())
        .or_else(|| info.and_then(|i| i.get("structured")).filter(|v| !v.is_null()));

    match structured {
        Some(value) if value.is_object() => Some(value.clone()),
        Some(_) => None,
        None => text_parts(payload)
            .iter()
            .find_map(|text| parse_assistant_text(text)),
    }
}

fn text_parts(payload: &Value) -> Vec<&str> {
    payload
        .get("parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// First nested object with a boolean `should_recommend` and an array `recommendations`
pub fn find_analysis_object(value: &Value) -> Option<&Value> {
    let mut stack = vec![value];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                let is_analysis = map.get("should_recommend").is_some_and(Value::is_boolean)
                    && map.get("recommendations").is_some_and(Value::is_array);
                if is_analysis {
                    return Some(node);
                }
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }
    None
}

fn analysis_or_object(parsed: Value) -> Option<Value> {
    if let Some(found) = find_analysis_object(&parsed) {
        return Some(found.clone());
    }
    parsed.is_object().then_some(parsed)
}

/// Best-effort recovery of the analysis object from free-form assistant text.
///
/// Tries, in order: the whole text as JSON, each line as JSON, a fenced
/// ```json block, and the first balanced `{...}` that parses.
pub fn parse_assistant_text(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
        if let Some(found) = analysis_or_object(parsed) {
            return Some(found);
        }
    }

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Ok(parsed) = serde_json::from_str::<Value>(line) {
            if let Some(found) = find_analysis_object(&parsed) {
                return Some(found.clone());
            }
        }
    }

    let fenced = FENCED_JSON_RE
        .get_or_init(|| Regex::new(r"(?is)```json\s*(\{.*?\})\s*```").expect("valid regex"));
    if let Some(block) = fenced.captures(text).and_then(|c| c.get(1)) {
        if let Ok(parsed) = serde_json::from_str::<Value>(block.as_str()) {
            if let Some(found) = analysis_or_object(parsed) {
                return Some(found);
            }
        }
    }

    first_balanced_object(text)
}

fn first_balanced_object(text: &str) -> Option<Value> {
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_end(&text[start..]) else {
            continue;
        };
        if let Ok(parsed) = serde_json::from_str::<Value>(&text[start..start + end]) {
            if let Some(found) = analysis_or_object(parsed) {
                return Some(found);
            }
        }
    }
    None
}

/// Byte length of the brace-balanced prefix of `text`, respecting JSON strings
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_output_preferred() {
        let response = json!({
            "info": {"structured_output": {"should_recommend": false, "recommendations": []}},
            "parts": [{"type": "text", "text": "{\"should_recommend\": true, \"recommendations\": []}"}]
        });
        let value = extract_structured(&response).unwrap();
        assert_eq!(value["should_recommend"], false);
    }

    #[test]
    fn test_structured_alias_and_data_wrapper() {
        let response = json!({"data": {"info": {"structured": {"should_recommend": true}}}});
        let value = extract_structured(&response).unwrap();
        assert_eq!(value["should_recommend"], true);
    }

    #[test]
    fn test_non_object_structured_is_rejected() {
        let response = json!({"info": {"structured_output": "should_recommend: true"}});
        assert!(extract_structured(&response).is_none());
        assert!(extract_structured(&json!({"info": {}})).is_none());
    }

    #[test]
    fn test_falls_back_to_text_parts() {
        let response = json!({
            "info": {"role": "assistant"},
            "parts": [
                {"type": "reasoning", "text": "{\"should_recommend\": false, \"recommendations\": []}"},
                {"type": "text", "text": "Here you go:\n```json\n{\"should_recommend\": true, \"recommendations\": []}\n```"}
            ]
        });
        let value = extract_structured(&response).unwrap();
        assert_eq!(value["should_recommend"], true);
    }

    #[test]
    fn test_parse_nested_analysis_line() {
        let text = "log line\n{\"result\": {\"should_recommend\": true, \"recommendations\": [{}]}}\ntrailer";
        let value = parse_assistant_text(text).unwrap();
        assert_eq!(value["recommendations"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_embedded_object_with_braces_in_strings() {
        let text = r#"Sure. {"should_recommend": true, "recommendations": [], "conversation_summary": "use {} and \"quotes\""} done"#;
        let value = parse_assistant_text(text).unwrap();
        assert_eq!(value["conversation_summary"], "use {} and \"quotes\"");
    }

    #[test]
    fn test_parse_plain_text_is_none() {
        assert!(parse_assistant_text("No KB updates needed.").is_none());
        assert!(parse_assistant_text("   ").is_none());
        assert!(parse_assistant_text("broken { json").is_none());
    }
}
