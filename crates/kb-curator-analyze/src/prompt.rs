//! Curator prompt and structured-output schema

use serde_json::{json, Value};

/// Title prefix marking sessions that exist only to serve tooling
pub const INTERNAL_TITLE_PREFIX: &str = "[internal]";

/// Title of the isolated session the analysis runs in
pub const ANALYZER_SESSION_TITLE: &str = "[internal] kb-curator";

const INSTRUCTIONS: &[&str] = &[
    "You are a senior KB curator.",
    "Analyze the history window pending compaction and identify durable knowledge that should update AI KB.",
    "Use cross-turn reasoning (patterns across the dialog), not single-turn keyword matching.",
    "Return strict JSON only.",
    "Schema:",
    "{",
    "  \"should_recommend\": boolean,",
    "  \"confidence\": \"low\"|\"medium\"|\"high\",",
    "  \"conversation_summary\": string,",
    "  \"recommendations\": [",
    "    {",
    "      \"action\": \"update_existing\"|\"create_new\",",
    "      \"target_path\": string,",
    "      \"reason\": string,",
    "      \"suggested_content\": string,",
    "      \"link_commands\": [string]",
    "    }",
    "  ],",
    "  \"index_updates\": [",
    "    {",
    "      \"index_path\": \"~/ai-kb/rules/INDEX.md\",",
    "      \"entry\": string,",
    "      \"reason\": string",
    "    }",
    "  ]",
    "}",
    "Constraints:",
    "- target_path must be under ~/ai-kb/rules/ or ~/ai-kb/commands/",
    "- recommendations should be concise and non-duplicative",
    "- if no KB updates are needed, return should_recommend=false with empty arrays",
    "",
    "History window:",
];

pub fn build_analyzer_prompt(history: &str) -> String {
    let mut prompt = INSTRUCTIONS.join("\n");
    prompt.push('\n');
    prompt.push_str(history);
    prompt
}

/// JSON schema the backend must constrain its answer to
pub fn build_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "should_recommend": {"type": "boolean"},
            "confidence": {"type": "string", "enum": ["low", "medium", "high"]},
            "conversation_summary": {"type": "string"},
            "recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "action": {"type": "string", "enum": ["update_existing", "create_new"]},
                        "target_path": {"type": "string"},
                        "reason": {"type": "string"},
                        "suggested_content": {"type": "string"},
                        "link_commands": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["action", "target_path", "reason", "suggested_content", "link_commands"]
                }
            },
            "index_updates": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "index_path": {"type": "string"},
                        "entry": {"type": "string"},
                        "reason": {"type": "string"}
                    },
                    "required": ["index_path", "entry", "reason"]
                }
            }
        },
        "required": ["should_recommend", "confidence", "conversation_summary", "recommendations", "index_updates"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_history_last() {
        let prompt = build_analyzer_prompt("user: how do I pin the toolchain?");
        assert!(prompt.starts_with("You are a senior KB curator."));
        assert!(prompt.contains("Return strict JSON only."));
        assert!(prompt.contains("~/ai-kb/rules/ or ~/ai-kb/commands/"));
        assert!(prompt.contains("should_recommend=false with empty arrays"));
        assert!(prompt.ends_with("History window:\nuser: how do I pin the toolchain?"));
    }

    #[test]
    fn test_schema_is_closed() {
        let schema = build_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"].as_array().unwrap().len(), 5);
        assert_eq!(
            schema["properties"]["confidence"]["enum"],
            json!(["low", "medium", "high"])
        );

        let rec = &schema["properties"]["recommendations"]["items"];
        assert_eq!(rec["additionalProperties"], false);
        assert_eq!(rec["required"].as_array().unwrap().len(), 5);

        let update = &schema["properties"]["index_updates"]["items"];
        assert_eq!(update["additionalProperties"], false);
        assert_eq!(update["required"], json!(["index_path", "entry", "reason"]));
    }
}
