// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for variable records

use super::*;

#[test]
fn scalar_has_no_children() {
    let v = Variable::scalar("name", "System.String", "\"World\"", VariableScope::Argument);
    assert!(!v.has_children);
    assert_eq!(v.child_count, None);
}

#[test]
fn type_field_renames_on_the_wire() {
    let v = Variable::scalar("i", "System.Int32", "5", VariableScope::Local);
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["type"], "System.Int32");
    assert_eq!(json["scope"], "local");
    assert!(json.get("type_name").is_none());
}
