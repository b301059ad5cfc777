// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the tool catalogue

use super::*;

#[test]
fn catalogue_covers_the_tool_surface() {
    let names: Vec<String> = catalogue().into_iter().map(|t| t.name).collect();
    for expected in [
        "debug_launch",
        "debug_attach",
        "debug_disconnect",
        "debug_state",
        "debug_continue",
        "debug_pause",
        "debug_step_over",
        "debug_step_into",
        "debug_step_out",
        "breakpoint_set",
        "breakpoint_remove",
        "breakpoint_list",
        "breakpoint_enable",
        "breakpoint_set_exception",
        "breakpoint_wait",
        "threads_list",
        "stacktrace_get",
        "variables_get",
        "evaluate",
        "object_inspect",
        "memory_read",
        "type_layout",
        "references_get",
        "modules_list",
        "modules_get_types",
        "modules_get_members",
        "modules_search",
    ] {
        assert!(names.contains(&expected.to_string()), "missing tool {expected}");
    }
}

#[test]
fn names_follow_noun_verb_convention() {
    for descriptor in catalogue() {
        assert!(
            descriptor.name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
            "bad tool name {}",
            descriptor.name
        );
        assert!(!descriptor.description.is_empty());
    }
}

#[test]
fn every_schema_is_an_object_schema() {
    for descriptor in catalogue() {
        assert_eq!(descriptor.input_schema["type"], "object", "tool {}", descriptor.name);
        assert!(descriptor.input_schema["properties"].is_object());
    }
}

#[test]
fn required_fields_exist_in_properties() {
    for descriptor in catalogue() {
        let properties = descriptor.input_schema["properties"].as_object().unwrap();
        if let Some(required) = descriptor.input_schema["required"].as_array() {
            for field in required {
                assert!(
                    properties.contains_key(field.as_str().unwrap()),
                    "tool {} requires unknown field {field}",
                    descriptor.name
                );
            }
        }
    }
}
