// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for inspection views

use super::*;

#[test]
fn memory_region_partial_read_keeps_error_note() {
    let region = MemoryRegion {
        address: "0x00007FF8A1234560".into(),
        requested_size: 64,
        actual_size: 16,
        data: "00".repeat(16),
        ascii: ".".repeat(16),
        error: Some("read stopped at unmapped page".into()),
    };
    let json = serde_json::to_value(&region).unwrap();
    assert_eq!(json["actual_size"], 16);
    assert_eq!(json["requested_size"], 64);
    assert!(json["error"].as_str().unwrap().contains("unmapped"));
}

#[test]
fn reference_direction_serializes_lowercase() {
    assert_eq!(serde_json::to_value(ReferenceDirection::Outbound).unwrap(), "outbound");
    assert_eq!(serde_json::to_value(ReferenceDirection::Inbound).unwrap(), "inbound");
}

#[test]
fn inspection_round_trips() {
    let obj = ObjectInspection {
        address: "0x1000".into(),
        type_name: "App.Person".into(),
        value: None,
        size: 48,
        fields: vec![InspectedField {
            name: "_name".into(),
            type_name: "System.String".into(),
            value: "\"World\"".into(),
            children: None,
        }],
        is_null: false,
        has_circular_ref: false,
        truncated: false,
    };
    let back: ObjectInspection =
        serde_json::from_str(&serde_json::to_string(&obj).unwrap()).unwrap();
    assert_eq!(back, obj);
}
