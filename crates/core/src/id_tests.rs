// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for breakpoint ID generation

use super::*;

#[test]
fn source_ids_carry_bp_prefix() {
    let id = BreakpointId::new_source();
    assert!(id.as_str().starts_with("bp-"));
    assert!(!id.is_exception());
}

#[test]
fn exception_ids_carry_ex_prefix() {
    let id = BreakpointId::new_exception();
    assert!(id.as_str().starts_with("ex-"));
    assert!(id.is_exception());
}

#[test]
fn suffix_is_a_uuid() {
    let id = BreakpointId::new_source();
    assert_eq!(id.suffix().len(), 36);
    assert!(uuid::Uuid::parse_str(id.suffix()).is_ok());
}

#[test]
fn generated_ids_are_unique() {
    let a = BreakpointId::new_source();
    let b = BreakpointId::new_source();
    assert_ne!(a, b);
}

#[test]
fn serde_is_transparent() {
    let id = BreakpointId::from_string("bp-1234");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"bp-1234\"");
    let back: BreakpointId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn borrow_allows_str_keyed_lookup() {
    use std::collections::HashMap;
    let id = BreakpointId::from_string("bp-abc");
    let mut map = HashMap::new();
    map.insert(id, 1u32);
    assert_eq!(map.get("bp-abc"), Some(&1));
}
