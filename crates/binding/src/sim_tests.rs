// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the scripted target

use super::*;
use ildbg_core::MethodToken;

const MODULE: u64 = 1;

fn token(row: u32) -> MethodToken {
    MethodToken::from_row(row)
}

/// Three points in `RunLoop`, then exit.
fn loop_program() -> SimProgram {
    SimProgram::new(4242, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(1), 0).local("i", RawValue::I32(0)))
        .point(TracePoint::new(MODULE, token(1), 6).local("i", RawValue::I32(1)))
        .point(TracePoint::new(MODULE, token(1), 12).local("i", RawValue::I32(2)))
}

async fn attached(program: SimProgram) -> (SimTarget, mpsc::Receiver<DebugEvent>) {
    let sim = SimTarget::new(program);
    let (tx, rx) = mpsc::channel(64);
    sim.attach(4242, tx).await.unwrap();
    (sim, rx)
}

fn drain(rx: &mut mpsc::Receiver<DebugEvent>) -> Vec<DebugEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn attach_delivers_module_and_thread_events() {
    let (_sim, mut rx) = attached(loop_program()).await;
    let events = drain(&mut rx);
    assert!(matches!(&events[0], DebugEvent::ModuleLoad { module } if module.module_id == MODULE));
    assert!(events.iter().any(|e| matches!(e, DebugEvent::CreateThread { thread_id: 1 })));
}

#[tokio::test]
async fn attach_to_wrong_pid_fails() {
    let sim = SimTarget::new(loop_program());
    let (tx, _rx) = mpsc::channel(64);
    assert_eq!(sim.attach(1, tx).await.unwrap_err(), BindingError::ProcessNotFound(1));
}

#[tokio::test]
async fn attach_to_native_process_is_not_managed() {
    let sim = SimTarget::new(SimProgram::new(7, "nginx").not_managed());
    let (tx, _rx) = mpsc::channel(64);
    assert_eq!(sim.attach(7, tx).await.unwrap_err(), BindingError::NotManaged(7));
}

#[tokio::test]
async fn double_attach_fails_until_detach() {
    let (sim, _rx) = attached(loop_program()).await;
    let (tx, _rx2) = mpsc::channel(64);
    assert!(matches!(
        sim.attach(4242, tx).await,
        Err(BindingError::AlreadyAttached(4242))
    ));
    sim.detach(false).await.unwrap();
    let (tx, _rx3) = mpsc::channel(64);
    sim.attach(4242, tx).await.unwrap();
    assert_eq!(sim.attach_count(), 2);
}

#[tokio::test]
async fn run_stops_at_bound_breakpoint() {
    let (sim, mut rx) = attached(loop_program()).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 6).await.unwrap();
    sim.run().await;
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        DebugEvent::BreakpointHit { il_offset: 6, thread_id: 1, .. }
    ));
    assert!(sim.is_suspended());
}

#[tokio::test]
async fn resume_after_hit_runs_to_exit() {
    let (sim, mut rx) = attached(loop_program()).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 6).await.unwrap();
    sim.run().await;
    drain(&mut rx);
    sim.resume().await.unwrap();
    let events = drain(&mut rx);
    assert!(matches!(events.last(), Some(DebugEvent::ExitProcess { exit_code: 0 })));
}

#[tokio::test]
async fn locals_are_readable_only_while_stopped() {
    let (sim, mut rx) = attached(loop_program()).await;
    drain(&mut rx);
    assert_eq!(sim.locals(1, 0).await.unwrap_err(), BindingError::NotStopped);

    sim.create_breakpoint(MODULE, token(1), 6).await.unwrap();
    sim.run().await;
    let locals = sim.locals(1, 0).await.unwrap();
    assert_eq!(locals.len(), 1);
    assert_eq!(locals[0].name, "i");
    assert_eq!(locals[0].value, RawValue::I32(1));

    assert!(matches!(
        sim.locals(1, 5).await,
        Err(BindingError::InvalidFrame { thread: 1, frame: 5 })
    ));
    assert!(matches!(sim.locals(9, 0).await, Err(BindingError::InvalidThread(9))));
}

#[tokio::test]
async fn step_over_skips_deeper_frames() {
    let program = SimProgram::new(4242, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(1), 0).depth(1))
        .point(TracePoint::new(MODULE, token(2), 0).depth(2)) // callee
        .point(TracePoint::new(MODULE, token(2), 4).depth(2))
        .point(TracePoint::new(MODULE, token(1), 6).depth(1)) // back in caller
        .point(TracePoint::new(MODULE, token(1), 12).depth(1));
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 0).await.unwrap();
    sim.run().await;
    drain(&mut rx);

    sim.create_step(1, StepMode::Over, Some((0, 6)), true).await.unwrap();
    sim.resume().await.unwrap();
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        DebugEvent::StepComplete { il_offset: 6, .. }
    ));
}

#[tokio::test]
async fn step_into_stops_in_callee() {
    let program = SimProgram::new(4242, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(1), 0).depth(1))
        .point(TracePoint::new(MODULE, token(2), 0).depth(2))
        .point(TracePoint::new(MODULE, token(1), 6).depth(1));
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 0).await.unwrap();
    sim.run().await;
    drain(&mut rx);

    sim.create_step(1, StepMode::Into, Some((0, 6)), true).await.unwrap();
    sim.resume().await.unwrap();
    let events = drain(&mut rx);
    assert!(matches!(
        &events[0],
        DebugEvent::StepComplete { method_token, il_offset: 0, .. } if *method_token == token(2)
    ));
}

#[tokio::test]
async fn step_out_returns_to_caller() {
    let program = SimProgram::new(4242, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(2), 0).depth(2))
        .point(TracePoint::new(MODULE, token(2), 4).depth(2))
        .point(TracePoint::new(MODULE, token(1), 6).depth(1));
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(2), 0).await.unwrap();
    sim.run().await;
    drain(&mut rx);

    sim.create_step(1, StepMode::Out, None, true).await.unwrap();
    sim.resume().await.unwrap();
    let events = drain(&mut rx);
    assert!(matches!(
        &events[0],
        DebugEvent::StepComplete { method_token, il_offset: 6, .. } if *method_token == token(1)
    ));
}

#[tokio::test]
async fn exception_point_suspends_with_event() {
    let program = SimProgram::new(4242, "TestTargetApp")
        .module(sim_module(MODULE, "TestTargetApp", "/app/TestTargetApp.dll"))
        .point(TracePoint::new(MODULE, token(1), 0).throws(
            "System.InvalidOperationException",
            "boom",
            Some(0x0200_0011),
        ));
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    sim.run().await;
    let events = drain(&mut rx);
    assert!(matches!(
        &events[0],
        DebugEvent::Exception { exception_type, is_first_chance: true, .. }
            if exception_type == "System.InvalidOperationException"
    ));
    assert!(sim.is_suspended());
}

#[tokio::test]
async fn funceval_behaviors() {
    let person = 0x1000u64;
    let program = loop_program()
        .object(
            person,
            SimObject {
                type_name: "TestTarget.Person".into(),
                fields: vec![("<Id>k__BackingField".into(), RawValue::I32(1001))],
                size: 32,
            },
        )
        .eval(token(10), EvalBehavior::ReadField("<Id>k__BackingField".into()))
        .eval(
            token(11),
            EvalBehavior::Throw {
                exception_type: "System.NotSupportedException".into(),
                message: "nope".into(),
            },
        );
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 0).await.unwrap();
    sim.run().await;
    drain(&mut rx);

    let this = RawValue::Object { address: person, type_name: "TestTarget.Person".into() };
    let value = sim.eval_method(1, token(10), Some(this.clone())).await.unwrap();
    assert_eq!(value, RawValue::I32(1001));

    let err = sim.eval_method(1, token(11), Some(this)).await.unwrap_err();
    assert!(matches!(err, BindingError::EvalException { .. }));
}

#[tokio::test(start_paused = true)]
async fn hung_funceval_is_released_by_abort() {
    let program = loop_program().eval(token(12), EvalBehavior::Hang);
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 0).await.unwrap();
    sim.run().await;

    let sim = Arc::new(sim);
    let eval_sim = Arc::clone(&sim);
    let eval = tokio::spawn(async move { eval_sim.eval_method(1, token(12), None).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    sim.abort_eval(1).await.unwrap();
    let result = eval.await.unwrap();
    assert_eq!(result.unwrap_err(), BindingError::EvalAborted);
}

#[tokio::test]
async fn memory_reads_are_partial_at_region_end() {
    let program = loop_program().memory_region(0x5000, vec![0xAB; 16]);
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    let bytes = sim.read_memory(0x5008, 64).await.unwrap();
    assert_eq!(bytes.len(), 8);
    assert!(matches!(
        sim.read_memory(0x9999, 4).await,
        Err(BindingError::ReadFailed { address: 0x9999 })
    ));
}

#[tokio::test]
async fn inbound_references_find_holders() {
    let program = loop_program()
        .object(
            0x1000,
            SimObject {
                type_name: "App.Holder".into(),
                fields: vec![(
                    "child".into(),
                    RawValue::Object { address: 0x2000, type_name: "App.Child".into() },
                )],
                size: 24,
            },
        )
        .object(
            0x2000,
            SimObject { type_name: "App.Child".into(), fields: vec![], size: 24 },
        );
    let (sim, mut rx) = attached(program).await;
    drain(&mut rx);
    let (holders, truncated) = sim.inbound_references(0x2000, 10).await.unwrap();
    assert_eq!(holders.len(), 1);
    assert!(!truncated);
    assert_eq!(holders[0].address(), Some(0x1000));
}

#[tokio::test]
async fn stop_injects_a_user_break() {
    let (sim, mut rx) = attached(loop_program()).await;
    drain(&mut rx);
    sim.stop().await.unwrap();
    let events = drain(&mut rx);
    assert!(matches!(&events[0], DebugEvent::UserBreak { .. }));
    assert!(sim.is_suspended());
}

#[tokio::test]
async fn launch_with_stop_at_entry_suspends() {
    let sim = SimTarget::new(loop_program());
    let (tx, mut rx) = mpsc::channel(64);
    let spec = LaunchSpec {
        program: PathBuf::from("/app/TestTargetApp.dll"),
        stop_at_entry: true,
        ..Default::default()
    };
    let handle = sim.launch(spec, tx).await.unwrap();
    assert_eq!(handle.pid, 4242);
    let events = drain(&mut rx);
    assert!(matches!(events.last(), Some(DebugEvent::EntryBreak { thread_id: 1 })));
    assert!(sim.is_suspended());
}

#[tokio::test]
async fn detach_clears_bindings() {
    let (sim, mut rx) = attached(loop_program()).await;
    drain(&mut rx);
    sim.create_breakpoint(MODULE, token(1), 6).await.unwrap();
    assert_eq!(sim.bound_breakpoint_count(), 1);
    sim.detach(false).await.unwrap();
    assert_eq!(sim.bound_breakpoint_count(), 0);
    assert_eq!(sim.detach_count(), 1);
}
