//! Built-in tool catalog tests, driven through `tools.call`.

use serde_json::{json, Value};

use capability_mcp::mcp::{Dispatcher, ServerInfo};
use capability_mcp::registry::Registry;
use capability_mcp::tools;

fn dispatcher() -> Dispatcher {
    let mut registry = Registry::new();
    tools::register_builtin(&mut registry).unwrap();
    Dispatcher::new(ServerInfo::default(), registry)
}

fn call(dispatcher: &Dispatcher, name: &str, arguments: &Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "mcp.tools.call",
        "params": { "name": name, "arguments": arguments },
    });
    serde_json::to_value(dispatcher.handle_line(&request.to_string())).unwrap()
}

// =============================================================================
// Calculator
// =============================================================================

#[test]
fn test_calculate() {
    let response = call(&dispatcher(), "calculate", &json!({"expression": "(2 + 3) * 4"}));
    assert_eq!(response["result"]["result"], json!(20.0));
}

#[test]
fn test_calculate_refuses_code() {
    let response = call(
        &dispatcher(),
        "calculate",
        &json!({"expression": "__import__('os').getcwd()"}),
    );
    assert_eq!(response["error"]["code"], -32602);
}

#[test]
fn test_calculate_division_by_zero() {
    let response = call(&dispatcher(), "calculate", &json!({"expression": "1/0"}));
    assert_eq!(response["error"]["code"], -32603);
    assert_eq!(response["error"]["data"]["tool"], "calculate");
}

// =============================================================================
// Summariser
// =============================================================================

#[test]
fn test_summarize_text() {
    let response = call(
        &dispatcher(),
        "summarize_text",
        &json!({"text": "The quick brown fox jumps over the lazy dog", "max_length": 12}),
    );
    assert_eq!(response["result"]["summary"], "The quick...");
    assert_eq!(response["result"]["truncated"], true);
}

#[test]
fn test_summarize_text_rejects_string_length() {
    let response = call(
        &dispatcher(),
        "summarize_text",
        &json!({"text": "abc", "max_length": "10"}),
    );
    assert_eq!(response["error"]["code"], -32602);
}

// =============================================================================
// Tutor Tools
// =============================================================================

#[test]
fn test_search_learning_materials() {
    let d = dispatcher();
    let response = call(&d, "search_learning_materials", &json!({"subject": "math"}));
    assert_eq!(
        response["result"]["available_topics"],
        json!(["algebra", "calculus", "geometry"])
    );

    let response = call(
        &d,
        "search_learning_materials",
        &json!({"subject": "chemistry"}),
    );
    assert_eq!(response["error"]["code"], -32602);
}

#[test]
fn test_progress_round_trip() {
    let d = dispatcher();
    let response = call(
        &d,
        "track_student_progress",
        &json!({"student_id": "kim", "subject": "math", "topic": "geometry", "completed": true, "score": 85}),
    );
    assert_eq!(response["result"]["status"], "completed");

    let response = call(&d, "get_student_progress", &json!({"student_id": "kim"}));
    let entry = &response["result"]["progress"]["math"]["geometry"];
    assert_eq!(entry["score"], 85);
    assert!(entry["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn test_progress_rejects_out_of_range_score() {
    let d = dispatcher();
    let response = call(
        &d,
        "track_student_progress",
        &json!({"student_id": "kim", "subject": "math", "topic": "algebra", "completed": true, "score": u64::MAX}),
    );
    assert_eq!(response["error"]["code"], -32602);

    let response = call(&d, "get_student_progress", &json!({"student_id": "kim"}));
    assert!(response["result"]["progress"]["math"]["algebra"].is_null());
}

#[test]
fn test_learning_materials_resource() {
    let d = dispatcher();
    let request = json!({"id": 1, "method": "resources.get", "params": {"id": "learning-materials"}});
    let response = serde_json::to_value(d.handle_line(&request.to_string())).unwrap();
    assert_eq!(response["result"]["type"], "catalog");
    assert!(response["result"]["content"]
        .as_str()
        .unwrap()
        .contains("programming"));
}
