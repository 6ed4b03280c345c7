mod common;

use common::{stdout_of, write_file, Sandbox};
use serde_json::{json, Value};
use std::net::TcpListener;

fn long_history() -> String {
    "user: the deploy job keeps failing on the cache step\nassistant: the cache key includes the runner image tag\n"
        .repeat(12)
}

#[test]
fn test_hook_answers_empty_object_on_malformed_stdin() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["hook:pre-compact"], "{this is not json", &[]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "{}");
}

#[test]
fn test_hook_answers_empty_object_on_empty_stdin() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["hook:pre-compact"], "", &[]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "{}");
}

#[test]
fn test_hook_is_silent_for_internal_invocations() {
    let sandbox = Sandbox::new();
    let payload = json!({ "input": { "sessionID": "ses_1", "text": long_history() } });
    let output = sandbox.run(
        &["hook:pre-compact"],
        &payload.to_string(),
        &[("AI_KB_ANALYZER_INTERNAL", "1")],
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "{}");
    assert!(!sandbox.queue_dir().exists());
}

#[test]
fn test_hook_survives_unreachable_backend() {
    let sandbox = Sandbox::new();
    let payload = json!({
        "input": {
            "sessionID": "ses_2",
            "directory": sandbox.project.path(),
            "text": long_history(),
        },
        "output": { "context": [] },
    });
    let output = sandbox.run(
        &["hook:pre-compact"],
        &payload.to_string(),
        &[("AI_KB_ANALYZER_TIMEOUT_SEC", "2")],
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "{}");
    assert!(kb_curator_store::markdown_file_names(&sandbox.queue_dir()).is_empty());
}

/// A backend address that accepts connections but never answers
fn silent_backend() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

fn compaction_payload(title: &str) -> String {
    json!({
        "input": {
            "sessionID": "ses_X",
            "session": { "title": title },
            "text": long_history(),
        },
        "output": {},
    })
    .to_string()
}

#[test]
fn test_hook_ignores_analyzer_sessions_across_processes() {
    let sandbox = Sandbox::new();
    let (listener, url) = silent_backend();

    let output = sandbox.run(
        &["hook:pre-compact"],
        &compaction_payload("[internal] kb-curator"),
        &[("AI_KB_BACKEND_URL", url.as_str()), ("AI_KB_ANALYZER_TIMEOUT_SEC", "1")],
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "{}");
    assert!(
        listener.accept().is_err(),
        "the analyzer's own session must not reach the backend"
    );
}

#[test]
fn test_hook_contacts_backend_for_user_sessions() {
    let sandbox = Sandbox::new();
    let (listener, url) = silent_backend();

    let output = sandbox.run(
        &["hook:pre-compact"],
        &compaction_payload("Fix the deploy cache"),
        &[("AI_KB_BACKEND_URL", url.as_str()), ("AI_KB_ANALYZER_TIMEOUT_SEC", "1")],
    );
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "{}");
    assert!(listener.accept().is_ok());
}

#[test]
fn test_filter_prints_only_novel_items() {
    let sandbox = Sandbox::new();
    write_file(
        &sandbox.home.path().join("ai-kb/rules/ci.md"),
        "# CI\nInclude the runner image tag in every cache key.\n",
    );
    let analysis_path = sandbox.project.path().join("analysis.json");
    write_file(
        &analysis_path,
        &json!({
            "should_recommend": true,
            "confidence": "high",
            "conversation_summary": "Fixed the deploy cache",
            "recommendations": [
                {
                    "action": "update_existing",
                    "target_path": "~/ai-kb/rules/ci.md",
                    "reason": "",
                    "suggested_content": "Include the runner image tag in the cache key",
                    "link_commands": []
                },
                {
                    "action": "create_new",
                    "target_path": "~/ai-kb/commands/clear-cache.md",
                    "reason": "Manual recovery step was needed",
                    "suggested_content": "Purge stale caches with the workflow dispatch button before retrying",
                    "link_commands": []
                }
            ],
            "index_updates": []
        })
        .to_string(),
    );

    let output = sandbox.run(
        &["filter", "--analysis", analysis_path.to_str().unwrap()],
        "",
        &[],
    );
    assert!(output.status.success());

    let filtered: Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(filtered["should_recommend"], true);
    let recommendations = filtered["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(
        recommendations[0]["target_path"],
        "~/ai-kb/commands/clear-cache.md"
    );
}

#[test]
fn test_filter_rejects_missing_analysis() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["filter", "--analysis", "absent.json"], "", &[]);
    assert!(!output.status.success());
}

#[test]
fn test_status_reports_queue() {
    let sandbox = Sandbox::new();
    write_file(&sandbox.queue_dir().join("20260101-000000-a-g.md"), "# one");

    let output = sandbox.run(
        &["status", "--directory", sandbox.project.path().to_str().unwrap()],
        "",
        &[("AI_KB_RECOMMENDATION_SCAN_LIMIT", "25")],
    );
    assert!(output.status.success());

    let report: Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(report["documents"], 1);
    assert_eq!(report["config"]["scan_limit"], 25);
    assert_eq!(report["config"]["backend_url"], "http://127.0.0.1:9");
}
