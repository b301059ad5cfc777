// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the stdio framing

use super::*;
use serde_json::json;
use tokio::io::BufReader;

#[tokio::test]
async fn reads_one_request_per_line() {
    let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\
                 {\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n";
    let mut reader = BufReader::new(input.as_bytes());
    let first = read_request(&mut reader).await.unwrap();
    assert_eq!(first.method, "ping");
    let second = read_request(&mut reader).await.unwrap();
    assert!(second.is_notification());
    assert!(matches!(
        read_request(&mut reader).await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn blank_lines_are_skipped() {
    let input = "\n\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
    let mut reader = BufReader::new(input.as_bytes());
    assert_eq!(read_request(&mut reader).await.unwrap().method, "ping");
}

#[tokio::test]
async fn malformed_line_is_a_malformed_error() {
    let input = "not json\n";
    let mut reader = BufReader::new(input.as_bytes());
    assert!(matches!(
        read_request(&mut reader).await,
        Err(ProtocolError::Malformed(_))
    ));
}

#[tokio::test]
async fn write_emits_single_newline_terminated_frame() {
    let mut out = Vec::new();
    let response = Response::success(json!(1), json!({ "ok": true }));
    write_response(&mut out, &response).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with('\n'));
    assert_eq!(text.matches('\n').count(), 1);
    let decoded: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(decoded["id"], 1);
}

#[test]
fn encode_decode_round_trip() {
    let response = Response::success(json!("id-9"), json!({ "x": [1, 2, 3] }));
    let line = encode(&response).unwrap();
    let request_json = "{\"jsonrpc\":\"2.0\",\"id\":\"id-9\",\"method\":\"m\",\"params\":{}}";
    let request = decode(request_json).unwrap();
    assert_eq!(request.id, Some(json!("id-9")));
    assert!(line.contains("\"x\""));
}
