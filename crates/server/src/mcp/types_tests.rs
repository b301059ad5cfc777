// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for JSON-RPC / MCP shapes

use super::*;
use serde_json::json;

#[test]
fn request_with_id_is_not_a_notification() {
    let request: Request = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/list",
    }))
    .unwrap();
    assert!(!request.is_notification());
    assert_eq!(request.method, "tools/list");
    assert_eq!(request.params, Value::Null);
}

#[test]
fn notification_has_no_id() {
    let request: Request = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized",
    }))
    .unwrap();
    assert!(request.is_notification());
}

#[test]
fn success_response_omits_error() {
    let response = Response::success(json!(7), json!({ "ok": true }));
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["id"], 7);
    assert_eq!(value["result"]["ok"], true);
    assert!(value.get("error").is_none());
}

#[test]
fn failure_response_carries_code_and_message() {
    let response = Response::failure(json!("abc"), METHOD_NOT_FOUND, "nope");
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(value["error"]["message"], "nope");
    assert!(value.get("result").is_none());
}

#[test]
fn tool_result_wraps_payload_as_text_content() {
    let payload = json!({ "success": true, "pid": 42 });
    let wrapped = tool_result(&payload, false);
    assert_eq!(wrapped["isError"], false);
    assert_eq!(wrapped["content"][0]["type"], "text");
    let text = wrapped["content"][0]["text"].as_str().unwrap();
    let parsed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(parsed, payload);
}

#[test]
fn initialize_result_advertises_tools() {
    let result = initialize_result("0.2.0");
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], "ildbg");
    assert!(result["capabilities"]["tools"].is_object());
}

#[test]
fn cancelled_params_accept_numeric_and_string_ids() {
    let params: CancelledParams =
        serde_json::from_value(json!({ "requestId": 5 })).unwrap();
    assert_eq!(params.request_id, json!(5));
    let params: CancelledParams =
        serde_json::from_value(json!({ "requestId": "abc", "reason": "user" })).unwrap();
    assert_eq!(params.reason.as_deref(), Some("user"));
}
