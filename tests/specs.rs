// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario specs.
//!
//! Each test drives the full stack (tool surface → engine → scripted
//! target) through the same entry points an MCP client uses, following
//! the sample debuggee scenarios: reattach cycles, a line breakpoint in
//! `MethodTarget.SayHello`, a conditional breakpoint in a loop, nested
//! property inspection, base-type members, and exception filters.

use ildbg_binding::{
    sim_module, EvalBehavior, RawValue, RuntimeBinding, SimObject, SimProgram, SimTarget,
    TracePoint,
};
use ildbg_core::{FakeClock, MethodToken};
use ildbg_engine::{Engine, EngineDeps};
use ildbg_server::Tools;
use ildbg_symbols::{FakeSymbols, MetadataSource, SymbolSource};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PID: u32 = 4242;
const MODULE: u64 = 1;

fn token(row: u32) -> MethodToken {
    MethodToken::from_row(row)
}

struct Stack {
    tools: Tools<FakeClock>,
    sim: Arc<SimTarget>,
    symbols: Arc<FakeSymbols>,
}

fn stack(program: SimProgram) -> Stack {
    let sim = Arc::new(SimTarget::new(program));
    let symbols = Arc::new(FakeSymbols::new());
    let deps = EngineDeps {
        binding: Arc::clone(&sim) as Arc<dyn RuntimeBinding>,
        symbols: Arc::clone(&symbols) as Arc<dyn SymbolSource>,
        metadata: Arc::clone(&symbols) as Arc<dyn MetadataSource>,
    };
    let (engine, events) = Engine::new(deps, FakeClock::new(), Default::default());
    tokio::spawn(Arc::clone(&engine).run_events(events));
    Stack { tools: Tools::new(engine), sim, symbols }
}

impl Stack {
    async fn call(&self, tool: &str, args: Value) -> Value {
        self.tools.dispatch(tool, args, &CancellationToken::new()).await
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

/// Scenario 1: attach, disconnect and attach again, ten times over.
#[tokio::test(start_paused = true)]
#[serial]
async fn reattach_cycle_always_succeeds() {
    let program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(1), 0));
    let s = stack(program);

    for round in 0..10 {
        let attached = s.call("debug_attach", json!({ "pid": PID })).await;
        assert_eq!(attached["success"], true, "round {round}: {attached}");
        let detached = s.call("debug_disconnect", json!({ "terminate": false })).await;
        assert_eq!(detached["success"], true, "round {round}: {detached}");
    }
    assert_eq!(s.sim.attach_count(), 10);
}

/// Scenario 2: breakpoint at `MethodTarget.SayHello` line 14, argument
/// inspection at the hit, then continue.
#[tokio::test(start_paused = true)]
#[serial]
async fn breakpoint_in_say_hello() {
    let program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(
            TracePoint::new(MODULE, token(3), 0)
                .function("MethodTarget.SayHello")
                .argument("name", RawValue::Str("World".into())),
        )
        .point(
            TracePoint::new(MODULE, token(3), 6)
                .function("MethodTarget.SayHello")
                .argument("name", RawValue::Str("World".into())),
        )
        .point(
            TracePoint::new(MODULE, token(3), 18)
                .function("MethodTarget.SayHello")
                .argument("name", RawValue::Str("World".into())),
        );
    let s = stack(program);
    s.symbols.add_line("MethodTarget.cs", 13, token(3), 0);
    s.symbols.add_line("MethodTarget.cs", 14, token(3), 6);
    s.symbols.add_line("MethodTarget.cs", 15, token(3), 18);

    s.call("debug_attach", json!({ "pid": PID })).await;
    settle().await;

    let set = s
        .call("breakpoint_set", json!({ "file": "MethodTarget.cs", "line": 14 }))
        .await;
    assert_eq!(set["verified"], true);

    // The client sends the command that makes the target call SayHello.
    s.sim.run().await;
    settle().await;

    let hit = s.call("breakpoint_wait", json!({ "timeout_ms": 5000 })).await;
    assert_eq!(hit["hit"], true);
    assert_eq!(hit["location"]["line"], 14);
    assert_eq!(hit["hit_count"], 1);

    let eval = s.call("evaluate", json!({ "expression": "name" })).await;
    assert_eq!(eval["result"], "\"World\"");
    assert_eq!(eval["type"], "System.String");

    let resumed = s.call("debug_continue", json!({})).await;
    assert_eq!(resumed["success"], true);
}

/// Scenario 3: conditional breakpoint `i == 5` inside `LoopTarget.RunLoop(10)`
/// pauses exactly once, on the sixth raw hit.
#[tokio::test(start_paused = true)]
#[serial]
async fn conditional_breakpoint_in_loop() {
    let mut program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"));
    for i in 0..10 {
        program = program.point(
            TracePoint::new(MODULE, token(2), 0)
                .function("LoopTarget.RunLoop")
                .local("i", RawValue::I32(i)),
        );
    }
    let s = stack(program);
    s.symbols.add_line("LoopTarget.cs", 17, token(2), 0);

    s.call("debug_attach", json!({ "pid": PID })).await;
    settle().await;
    s.call(
        "breakpoint_set",
        json!({ "file": "LoopTarget.cs", "line": 17, "condition": "i == 5" }),
    )
    .await;

    s.sim.run().await;
    settle().await;

    let hit = s.call("breakpoint_wait", json!({ "timeout_ms": 5000 })).await;
    assert_eq!(hit["hit"], true);
    assert_eq!(hit["hit_count"], 6);

    // No second satisfying hit exists.
    s.call("debug_continue", json!({})).await;
    settle().await;
    let next = s.call("breakpoint_wait", json!({ "timeout_ms": 100 })).await;
    assert_ne!(next["reason"], "breakpoint");
}

fn object_target_program() -> SimProgram {
    SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(
            TracePoint::new(MODULE, token(7), 0)
                .function("ObjectTarget.ProcessUser")
                .this(RawValue::Object {
                    address: 0x100,
                    type_name: "TestTarget.ObjectTarget".into(),
                }),
        )
        .object(
            0x100,
            SimObject {
                type_name: "TestTarget.ObjectTarget".into(),
                fields: vec![(
                    "_currentUser".into(),
                    RawValue::Object { address: 0x200, type_name: "TestTarget.Person".into() },
                )],
                size: 24,
            },
        )
        .object(
            0x200,
            SimObject {
                type_name: "TestTarget.Person".into(),
                fields: vec![
                    ("_name".into(), RawValue::Str("Alice".into())),
                    (
                        "<HomeAddress>k__BackingField".into(),
                        RawValue::Object {
                            address: 0x300,
                            type_name: "TestTarget.Address".into(),
                        },
                    ),
                ],
                size: 40,
            },
        )
        .object(
            0x300,
            SimObject {
                type_name: "TestTarget.Address".into(),
                fields: vec![("City".into(), RawValue::Str("Warsaw".into()))],
                size: 32,
            },
        )
        .eval(token(10), EvalBehavior::Return(RawValue::I32(1001)))
}

async fn paused_in_process_user() -> Stack {
    let s = stack(object_target_program());
    s.symbols.add_line("ObjectTarget.cs", 30, token(7), 0);
    s.symbols.set_base("TestTarget.Person", "TestTarget.BaseEntity");
    s.symbols.set_base("TestTarget.BaseEntity", "System.Object");
    s.symbols.add_getter("TestTarget.BaseEntity", "Id", token(10));

    s.call("debug_attach", json!({ "pid": PID })).await;
    settle().await;
    s.call("breakpoint_set", json!({ "file": "ObjectTarget.cs", "line": 30 })).await;
    s.sim.run().await;
    settle().await;
    let hit = s.call("breakpoint_wait", json!({ "timeout_ms": 5000 })).await;
    assert_eq!(hit["hit"], true);
    s
}

/// Scenario 4: nested property inspection through field, backing field
/// and a null fault mid-path.
#[tokio::test(start_paused = true)]
#[serial]
async fn nested_property_inspection() {
    let s = paused_in_process_user().await;

    let city = s
        .call(
            "object_inspect",
            json!({ "object_ref": "this._currentUser.HomeAddress.City" }),
        )
        .await;
    assert_eq!(city["success"], true);
    assert_eq!(city["type_name"], "System.String");
    assert_eq!(city["value"], "\"Warsaw\"");

    // Force the fault and check the error names the null link.
    s.sim.set_object_field(0x100, "_currentUser", RawValue::Null);
    let error = s
        .call(
            "object_inspect",
            json!({ "object_ref": "this._currentUser.HomeAddress.City" }),
        )
        .await;
    assert_eq!(error["error"], true);
    assert_eq!(error["code"], "null_reference");
    assert!(error["message"].as_str().unwrap().contains("_currentUser"));
}

/// Scenario 5: a property declared on the base type resolves through the
/// metadata chain and funceval.
#[tokio::test(start_paused = true)]
#[serial]
async fn base_type_property_evaluates() {
    let s = paused_in_process_user().await;
    let eval = s
        .call("evaluate", json!({ "expression": "this._currentUser.Id" }))
        .await;
    assert_eq!(eval["success"], true);
    assert_eq!(eval["result"], "1001");
    assert_eq!(eval["type"], "System.Int32");
}

/// Scenario 6: first-chance exception breakpoint with subtype matching.
#[tokio::test(start_paused = true)]
#[serial]
async fn exception_breakpoint_reports_first_chance() {
    let program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(5), 0).throws(
            "System.InvalidOperationException",
            "Operation is not valid due to the current state of the object.",
            None,
        ));
    let s = stack(program);
    s.call("debug_attach", json!({ "pid": PID })).await;
    settle().await;

    let set = s
        .call(
            "breakpoint_set_exception",
            json!({
                "exception_type": "System.InvalidOperationException",
                "include_subtypes": true,
            }),
        )
        .await;
    assert_eq!(set["success"], true);
    assert!(set["id"].as_str().unwrap().starts_with("ex-"));

    s.sim.run().await;
    settle().await;

    let hit = s.call("breakpoint_wait", json!({ "timeout_ms": 5000 })).await;
    assert_eq!(hit["hit"], true);
    assert_eq!(hit["reason"], "exception");
    assert_eq!(hit["exception"]["type"], "System.InvalidOperationException");
    assert_eq!(hit["exception"]["is_first_chance"], true);
}

/// Enable/disable is idempotent through the tool surface.
#[tokio::test(start_paused = true)]
#[serial]
async fn enable_disable_idempotence() {
    let program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(3), 6));
    let s = stack(program);
    s.symbols.add_line("MethodTarget.cs", 14, token(3), 6);
    s.call("debug_attach", json!({ "pid": PID })).await;
    settle().await;
    let set = s
        .call("breakpoint_set", json!({ "file": "MethodTarget.cs", "line": 14 }))
        .await;
    let id = set["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let disabled = s
            .call("breakpoint_enable", json!({ "id": &id, "enabled": false }))
            .await;
        assert_eq!(disabled["breakpoint"]["state"], "disabled");
    }
    for _ in 0..2 {
        let enabled = s
            .call("breakpoint_enable", json!({ "id": &id, "enabled": true }))
            .await;
        assert_eq!(enabled["breakpoint"]["state"], "bound");
        assert_eq!(enabled["breakpoint"]["verified"], true);
    }
}

/// A wait outstanding when the target exits resolves with `exited`.
#[tokio::test(start_paused = true)]
#[serial]
async fn wait_resolves_when_target_exits() {
    let program = SimProgram::new(PID, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(1), 0));
    let s = stack(program);
    s.call("debug_attach", json!({ "pid": PID })).await;
    settle().await;
    s.sim.run().await;
    settle().await;

    let hit = s.call("breakpoint_wait", json!({ "timeout_ms": 5000 })).await;
    assert_eq!(hit["hit"], false);
    assert_eq!(hit["reason"], "exited");
    assert_eq!(hit["exit_code"], 0);
}
