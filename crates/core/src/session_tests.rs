// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for session state

use super::*;

fn paused() -> SessionState {
    SessionState::Paused {
        reason: PauseReason::Breakpoint,
        thread_id: 1,
        location: Some(SourceLocation::new("/src/Program.cs", 14)),
        breakpoint_id: None,
    }
}

#[yare::parameterized(
    disconnected = { SessionState::Disconnected, "disconnected" },
    running      = { SessionState::Running, "running" },
    exited       = { SessionState::Exited { exit_code: 0 }, "exited" },
)]
fn state_names(state: SessionState, expected: &str) {
    assert_eq!(state.name(), expected);
}

#[test]
fn paused_is_attached_and_paused() {
    let state = paused();
    assert_eq!(state.name(), "paused");
    assert!(state.is_paused());
    assert!(state.is_attached());
    assert!(!state.is_running());
}

#[test]
fn exited_is_not_attached() {
    let state = SessionState::Exited { exit_code: 3 };
    assert!(!state.is_attached());
    assert!(!state.is_paused());
}

#[test]
fn paused_state_serializes_with_tag_and_reason() {
    let json = serde_json::to_value(paused()).unwrap();
    assert_eq!(json["state"], "paused");
    assert_eq!(json["reason"], "breakpoint");
    assert_eq!(json["thread_id"], 1);
    assert_eq!(json["location"]["line"], 14);
}

#[test]
fn location_display_includes_column_when_present() {
    let mut loc = SourceLocation::new("/a/B.cs", 7);
    assert_eq!(loc.to_string(), "/a/B.cs:7");
    loc.column = Some(13);
    assert_eq!(loc.to_string(), "/a/B.cs:7:13");
}
