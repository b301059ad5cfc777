// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static tool catalogue served by `tools/list`.

use crate::mcp::ToolDescriptor;
use serde_json::{json, Value};

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// The full tool surface.
pub fn catalogue() -> Vec<ToolDescriptor> {
    vec![
        tool(
            "debug_launch",
            "Launch a managed program under the debugger",
            schema(
                json!({
                    "program": { "type": "string", "description": "Path to the program or entry assembly" },
                    "args": { "type": "array", "items": { "type": "string" } },
                    "cwd": { "type": "string" },
                    "env": { "type": "object", "additionalProperties": { "type": "string" } },
                    "stop_at_entry": { "type": "boolean", "default": false },
                }),
                &["program"],
            ),
        ),
        tool(
            "debug_attach",
            "Attach to a running managed process by pid",
            schema(json!({ "pid": { "type": "integer" } }), &["pid"]),
        ),
        tool(
            "debug_disconnect",
            "Detach from the target, optionally terminating it",
            schema(json!({ "terminate": { "type": "boolean", "default": false } }), &[]),
        ),
        tool(
            "debug_state",
            "Current session state, pause reason and location",
            schema(json!({}), &[]),
        ),
        tool(
            "debug_continue",
            "Resume execution from a paused state",
            schema(json!({ "thread_id": { "type": "integer" } }), &[]),
        ),
        tool(
            "debug_pause",
            "Inject a pause into the running target",
            schema(json!({}), &[]),
        ),
        tool(
            "debug_step_over",
            "Step over the current source line",
            schema(json!({ "thread_id": { "type": "integer" } }), &[]),
        ),
        tool(
            "debug_step_into",
            "Step into calls on the current source line",
            schema(json!({ "thread_id": { "type": "integer" } }), &[]),
        ),
        tool(
            "debug_step_out",
            "Step out of the current method",
            schema(json!({ "thread_id": { "type": "integer" } }), &[]),
        ),
        tool(
            "debug_processes",
            "List host processes, flagging managed ones",
            schema(json!({ "managed_only": { "type": "boolean", "default": false } }), &[]),
        ),
        tool(
            "breakpoint_set",
            "Set a source-line or function breakpoint; unresolved locations stay pending",
            schema(
                json!({
                    "file": { "type": "string", "description": "Absolute source path" },
                    "line": { "type": "integer", "description": "1-based line" },
                    "column": { "type": "integer" },
                    "function": { "type": "string", "description": "Fully qualified method name" },
                    "condition": { "type": "string", "description": "Pause only when this evaluates true" },
                    "hit_count": { "type": "integer", "description": "Pause on the nth hit" },
                    "log_message": { "type": "string", "description": "Logpoint template; logs and resumes" },
                }),
                &[],
            ),
        ),
        tool(
            "breakpoint_remove",
            "Remove a breakpoint by id",
            schema(json!({ "id": { "type": "string" } }), &["id"]),
        ),
        tool(
            "breakpoint_list",
            "List all breakpoints and exception filters",
            schema(json!({}), &[]),
        ),
        tool(
            "breakpoint_enable",
            "Enable or disable a breakpoint without removing it",
            schema(
                json!({
                    "id": { "type": "string" },
                    "enabled": { "type": "boolean", "default": true },
                }),
                &["id"],
            ),
        ),
        tool(
            "breakpoint_set_exception",
            "Break when an exception type is thrown",
            schema(
                json!({
                    "exception_type": { "type": "string" },
                    "break_on_first_chance": { "type": "boolean", "default": true },
                    "break_on_second_chance": { "type": "boolean", "default": true },
                    "include_subtypes": { "type": "boolean", "default": true },
                }),
                &["exception_type"],
            ),
        ),
        tool(
            "breakpoint_wait",
            "Block until a breakpoint or exception hit, the timeout, or target exit",
            schema(
                json!({
                    "timeout_ms": { "type": "integer", "default": 30000 },
                    "breakpoint_id": { "type": "string", "description": "Only return hits for this breakpoint" },
                }),
                &[],
            ),
        ),
        tool("threads_list", "List target threads", schema(json!({}), &[])),
        tool(
            "stacktrace_get",
            "Stack frames of a paused thread",
            schema(
                json!({
                    "thread_id": { "type": "integer" },
                    "start_frame": { "type": "integer", "default": 0 },
                    "max_frames": { "type": "integer", "default": 20 },
                }),
                &[],
            ),
        ),
        tool(
            "variables_get",
            "Locals and arguments of a frame, or children of an expansion path",
            schema(
                json!({
                    "thread_id": { "type": "integer" },
                    "frame_index": { "type": "integer", "default": 0 },
                    "scope": { "type": "string", "enum": ["local", "argument", "this"] },
                    "expand": { "type": "string", "description": "Dotted path to expand" },
                }),
                &[],
            ),
        ),
        tool(
            "evaluate",
            "Evaluate an expression against a paused frame",
            schema(
                json!({
                    "expression": { "type": "string" },
                    "thread_id": { "type": "integer" },
                    "frame_index": { "type": "integer", "default": 0 },
                }),
                &["expression"],
            ),
        ),
        tool(
            "object_inspect",
            "Inspect an object's fields with bounded depth and cycle detection",
            schema(
                json!({
                    "object_ref": { "type": "string", "description": "Dotted path to the object" },
                    "depth": { "type": "integer", "default": 1 },
                    "max_fields": { "type": "integer", "default": 50 },
                }),
                &["object_ref"],
            ),
        ),
        tool(
            "memory_read",
            "Read raw target memory at a hex address",
            schema(
                json!({
                    "address": { "type": "string", "description": "e.g. 0x00007FF8A1234560" },
                    "size": { "type": "integer" },
                }),
                &["address", "size"],
            ),
        ),
        tool(
            "type_layout",
            "Field offsets, sizes and padding of a type",
            schema(
                json!({
                    "type_name": { "type": "string" },
                    "include_inherited": { "type": "boolean", "default": false },
                }),
                &["type_name"],
            ),
        ),
        tool(
            "references_get",
            "Outbound or inbound references of an object",
            schema(
                json!({
                    "object_ref": { "type": "string" },
                    "direction": { "type": "string", "enum": ["outbound", "inbound"] },
                    "max": { "type": "integer", "default": 20 },
                }),
                &["object_ref", "direction"],
            ),
        ),
        tool(
            "modules_list",
            "Loaded modules",
            schema(json!({ "include_system": { "type": "boolean", "default": false } }), &[]),
        ),
        tool(
            "modules_get_types",
            "Types defined in a module",
            schema(
                json!({
                    "module_name": { "type": "string" },
                    "namespace": { "type": "string" },
                }),
                &["module_name"],
            ),
        ),
        tool(
            "modules_get_members",
            "Methods, properties and fields of a type",
            schema(
                json!({
                    "type_name": { "type": "string" },
                    "member_kinds": {
                        "type": "array",
                        "items": { "type": "string", "enum": ["method", "property", "field"] },
                    },
                }),
                &["type_name"],
            ),
        ),
        tool(
            "modules_search",
            "Search loaded modules for types or methods",
            schema(
                json!({
                    "pattern": { "type": "string" },
                    "search_type": { "type": "string", "enum": ["types", "methods", "all"], "default": "all" },
                }),
                &["pattern"],
            ),
        ),
    ]
}

#[cfg(test)]
#[path = "catalogue_tests.rs"]
mod tests;
