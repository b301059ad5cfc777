// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for browsing DTOs

use super::*;

#[test]
fn member_kind_serializes_lowercase() {
    assert_eq!(serde_json::to_value(MemberKind::Method).unwrap(), "method");
    assert_eq!(serde_json::to_value(MemberKind::Property).unwrap(), "property");
    assert_eq!(serde_json::to_value(MemberKind::Field).unwrap(), "field");
}

#[test]
fn type_hit_omits_declaring_type() {
    let hit = SearchHit {
        module: "TestTargetApp".into(),
        name: "TestTargetApp.MethodTarget".into(),
        kind: SearchKind::Type,
        declaring_type: None,
    };
    let json = serde_json::to_value(&hit).unwrap();
    assert_eq!(json["kind"], "type");
    assert!(json.get("declaring_type").is_none());
}
