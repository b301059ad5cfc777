// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for tool dispatch and envelopes

use super::*;
use ildbg_binding::{sim_module, RawValue, RuntimeBinding, SimProgram, SimTarget, TracePoint};
use ildbg_core::{FakeClock, MethodToken};
use ildbg_engine::EngineDeps;
use ildbg_symbols::{FakeSymbols, MetadataSource, SymbolSource};
use serde_json::json;
use std::time::Duration;

const PID: u32 = 4242;
const MODULE: u64 = 1;

struct Fixture {
    tools: Tools<FakeClock>,
    sim: Arc<SimTarget>,
    symbols: Arc<FakeSymbols>,
}

fn fixture() -> Fixture {
    let program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(
            TracePoint::new(MODULE, MethodToken::from_row(3), 6)
                .function("MethodTarget.SayHello")
                .argument("name", RawValue::Str("World".into())),
        );
    let sim = Arc::new(SimTarget::new(program));
    let symbols = Arc::new(FakeSymbols::new());
    symbols.add_line("MethodTarget.cs", 14, MethodToken::from_row(3), 6);
    let deps = EngineDeps {
        binding: Arc::clone(&sim) as Arc<dyn RuntimeBinding>,
        symbols: Arc::clone(&symbols) as Arc<dyn SymbolSource>,
        metadata: Arc::clone(&symbols) as Arc<dyn MetadataSource>,
    };
    let (engine, events) = Engine::new(deps, FakeClock::new(), Default::default());
    tokio::spawn(Arc::clone(&engine).run_events(events));
    Fixture { tools: Tools::new(engine), sim, symbols }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test(start_paused = true)]
async fn attach_returns_success_envelope() {
    let f = fixture();
    let payload = f
        .tools
        .dispatch("debug_attach", json!({ "pid": PID }), &cancel())
        .await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["pid"], PID);
    assert_eq!(payload["state"], "running");
    assert_eq!(payload["process_name"], "TestTargetApp");
    assert_eq!(payload["runtime_version"], "8.0.11");
}

#[tokio::test(start_paused = true)]
async fn attach_to_missing_pid_is_an_error_envelope() {
    let f = fixture();
    let payload = f
        .tools
        .dispatch("debug_attach", json!({ "pid": 9 }), &cancel())
        .await;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "process_not_found");
    assert!(payload["message"].as_str().unwrap().contains('9'));
}

#[tokio::test(start_paused = true)]
async fn unknown_tool_reports_invalid_argument() {
    let f = fixture();
    let payload = f.tools.dispatch("debug_frobnicate", json!({}), &cancel()).await;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "invalid_argument");
}

#[tokio::test(start_paused = true)]
async fn bad_arguments_are_invalid_argument() {
    let f = fixture();
    let payload = f
        .tools
        .dispatch("debug_attach", json!({ "pid": "not-a-number" }), &cancel())
        .await;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "invalid_argument");
}

#[tokio::test(start_paused = true)]
async fn full_breakpoint_hit_flow_through_tools() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    settle().await;

    let set = f
        .tools
        .dispatch(
            "breakpoint_set",
            json!({ "file": "MethodTarget.cs", "line": 14 }),
            &cancel(),
        )
        .await;
    assert_eq!(set["success"], true);
    assert_eq!(set["verified"], true);
    let id = set["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("bp-"));

    f.sim.run().await;
    settle().await;

    let hit = f
        .tools
        .dispatch("breakpoint_wait", json!({ "timeout_ms": 1000 }), &cancel())
        .await;
    assert_eq!(hit["success"], true);
    assert_eq!(hit["hit"], true);
    assert_eq!(hit["breakpoint_id"], id.as_str());
    assert_eq!(hit["hit_count"], 1);
    assert_eq!(hit["location"]["line"], 14);

    let eval = f
        .tools
        .dispatch("evaluate", json!({ "expression": "name" }), &cancel())
        .await;
    assert_eq!(eval["success"], true);
    assert_eq!(eval["result"], "\"World\"");
    assert_eq!(eval["type"], "System.String");

    let state = f.tools.dispatch("debug_state", json!({}), &cancel()).await;
    assert_eq!(state["state"], "paused");
    assert_eq!(state["reason"], "breakpoint");

    let resumed = f.tools.dispatch("debug_continue", json!({}), &cancel()).await;
    assert_eq!(resumed["success"], true);
    assert_eq!(resumed["state"], "running");
}

#[tokio::test(start_paused = true)]
async fn wait_timeout_is_success_with_reason() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    let payload = f
        .tools
        .dispatch("breakpoint_wait", json!({ "timeout_ms": 50 }), &cancel())
        .await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["hit"], false);
    assert_eq!(payload["reason"], "timeout");
}

#[tokio::test(start_paused = true)]
async fn wait_cancellation_reports_cancelled() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    let token = cancel();
    token.cancel();
    let payload = f
        .tools
        .dispatch("breakpoint_wait", json!({ "timeout_ms": 60000 }), &token)
        .await;
    assert_eq!(payload["hit"], false);
    assert_eq!(payload["reason"], "cancelled");
}

#[tokio::test(start_paused = true)]
async fn inspection_while_running_is_not_stopped() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    settle().await;
    let payload = f.tools.dispatch("stacktrace_get", json!({}), &cancel()).await;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "not_stopped");
}

#[tokio::test(start_paused = true)]
async fn modules_list_through_tools() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    settle().await;
    let payload = f
        .tools
        .dispatch("modules_list", json!({ "include_system": true }), &cancel())
        .await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["modules"][0]["name"], "TestTargetApp");

    // keep the fake symbols alive for the whole test
    let _ = &f.symbols;
}

#[tokio::test(start_paused = true)]
async fn eval_error_envelope_carries_subcode() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    settle().await;
    f.tools
        .dispatch(
            "breakpoint_set",
            json!({ "file": "MethodTarget.cs", "line": 14 }),
            &cancel(),
        )
        .await;
    f.sim.run().await;
    settle().await;

    let payload = f
        .tools
        .dispatch("evaluate", json!({ "expression": "nope" }), &cancel())
        .await;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "evaluation_failed");
    assert_eq!(payload["details"]["subcode"], "variable_unavailable");
}

#[tokio::test(start_paused = true)]
async fn modules_search_rejects_bad_search_type() {
    let f = fixture();
    f.tools.dispatch("debug_attach", json!({ "pid": PID }), &cancel()).await;
    settle().await;
    let payload = f
        .tools
        .dispatch(
            "modules_search",
            json!({ "pattern": "x", "search_type": "fields" }),
            &cancel(),
        )
        .await;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "invalid_argument");
}
