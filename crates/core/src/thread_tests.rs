// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for thread and frame records

use super::*;

#[test]
fn thread_state_serializes_lowercase() {
    let t = ThreadInfo { thread_id: 4, name: None, state: ThreadState::Stopped, is_current: true };
    let json = serde_json::to_value(&t).unwrap();
    assert_eq!(json["state"], "stopped");
    assert_eq!(json["thread_id"], 4);
    assert!(json.get("name").is_none());
}

#[test]
fn external_frame_omits_location_and_arguments() {
    let f = FrameInfo {
        index: 2,
        function: "System.Threading.Tasks.Task.Wait".into(),
        module: Some("System.Private.CoreLib".into()),
        location: None,
        is_external: true,
        arguments: vec![],
    };
    let json = serde_json::to_value(&f).unwrap();
    assert_eq!(json["is_external"], true);
    assert!(json.get("location").is_none());
    assert!(json.get("arguments").is_none());
}
