// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for breakpoint records

use super::*;

#[test]
fn new_source_breakpoint_starts_pending_and_unverified() {
    let bp = Breakpoint::at_line("/src/MethodTarget.cs", 14);
    assert_eq!(bp.state, BindState::Pending);
    assert!(bp.enabled);
    assert!(!bp.verified);
    assert_eq!(bp.hit_count, 0);
    assert!(bp.id.as_str().starts_with("bp-"));
}

#[test]
fn exception_breakpoint_defaults_to_both_chances_and_subtypes() {
    let bp = ExceptionBreakpoint::new("System.InvalidOperationException");
    assert!(bp.break_on_first_chance);
    assert!(bp.break_on_second_chance);
    assert!(bp.include_subtypes);
    assert!(bp.id.as_str().starts_with("ex-"));
}

#[yare::parameterized(
    with_column    = { Some(9), "/src/A.cs:3:9" },
    without_column = { None, "/src/A.cs:3" },
)]
fn source_target_describe(column: Option<u32>, expected: &str) {
    let target = BreakpointTarget::Source { file: "/src/A.cs".into(), line: 3, column };
    assert_eq!(target.describe(), expected);
}

#[test]
fn function_target_describe_is_the_name() {
    let target = BreakpointTarget::Function { function: "App.Worker.Run".into() };
    assert_eq!(target.describe(), "App.Worker.Run");
}

#[test]
fn breakpoint_round_trips_through_json() {
    let mut bp = Breakpoint::at_function("App.Worker.Run");
    bp.condition = Some("i == 5".into());
    bp.hit_count = 3;
    let json = serde_json::to_string(&bp).unwrap();
    let back: Breakpoint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, bp);
}
