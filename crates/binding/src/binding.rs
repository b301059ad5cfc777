// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The native debug binding trait.
//!
//! Wraps the runtime's debugging interface family behind a seam the engine
//! can drive. Runtime events are delivered serially through the channel
//! handed to `attach`/`launch`; every suspension event leaves the target
//! stopped until the engine issues exactly one resume decision (`resume`,
//! a step, or `detach`). Forgetting the resume wedges the target.

use crate::error::BindingError;
use crate::types::{
    LaunchSpec, ProcessInfo, RawFrame, RawThread, RawValue, SessionHandle, StepMode, VariableSlot,
};
use async_trait::async_trait;
use ildbg_core::{DebugEvent, MethodToken};
use tokio::sync::mpsc;

#[async_trait]
pub trait RuntimeBinding: Send + Sync {
    /// List debuggable processes on this host.
    async fn enumerate_processes(&self) -> Result<Vec<ProcessInfo>, BindingError>;

    /// Launch a process under the debugger. Module-load and thread
    /// callbacks flow through `events` as the runtime initialises.
    async fn launch(
        &self,
        spec: LaunchSpec,
        events: mpsc::Sender<DebugEvent>,
    ) -> Result<SessionHandle, BindingError>;

    /// Attach to a running managed process.
    async fn attach(
        &self,
        pid: u32,
        events: mpsc::Sender<DebugEvent>,
    ) -> Result<SessionHandle, BindingError>;

    /// Detach, optionally terminating the target. Must release all native
    /// resources so a subsequent attach creates a fresh binding.
    async fn detach(&self, terminate: bool) -> Result<(), BindingError>;

    /// Resume from a stopped state (the cooperative continue).
    async fn resume(&self) -> Result<(), BindingError>;

    /// Inject a synchronisation break; surfaces as a `UserBreak` event.
    async fn stop(&self) -> Result<(), BindingError>;

    /// Terminate the target. Swallows the runtime's illegal-shutdown-order
    /// fault (logged at warn) so teardown is always possible.
    async fn terminate(&self) -> Result<(), BindingError>;

    // -- breakpoints and stepping --

    /// Bind an IL breakpoint; returns an opaque handle for removal.
    async fn create_breakpoint(
        &self,
        module_id: u64,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<u64, BindingError>;

    async fn remove_breakpoint(&self, handle: u64) -> Result<(), BindingError>;

    /// Arm an IL-range stepper on a stopped thread. The step completes on
    /// the next resume and surfaces as a `StepComplete` event.
    async fn create_step(
        &self,
        thread_id: u32,
        mode: StepMode,
        il_range: Option<(u32, u32)>,
        just_my_code: bool,
    ) -> Result<(), BindingError>;

    // -- inspection (stopped target only) --

    async fn threads(&self) -> Result<Vec<RawThread>, BindingError>;

    async fn frames(&self, thread_id: u32) -> Result<Vec<RawFrame>, BindingError>;

    /// Locals, arguments and `this` of one frame.
    async fn locals(&self, thread_id: u32, frame_index: u32)
        -> Result<Vec<VariableSlot>, BindingError>;

    /// Read a named field of a composite value. `Ok(None)` when the type
    /// has no such field (the engine then tries backing fields and
    /// property getters).
    async fn read_field(
        &self,
        value: &RawValue,
        field: &str,
    ) -> Result<Option<RawValue>, BindingError>;

    /// Read one array element.
    async fn read_element(
        &self,
        value: &RawValue,
        index: u32,
    ) -> Result<Option<RawValue>, BindingError>;

    /// All fields of a composite value in declaration order.
    async fn object_fields(
        &self,
        value: &RawValue,
    ) -> Result<Vec<(String, RawValue)>, BindingError>;

    /// Object size in bytes, when the runtime can answer.
    async fn object_size(&self, value: &RawValue) -> Result<Option<u64>, BindingError>;

    // -- funceval --

    /// Schedule a synchronous method call on a stopped thread and wait for
    /// completion. The engine bounds this with its eval timeout and calls
    /// `abort_eval` on expiry.
    async fn eval_method(
        &self,
        thread_id: u32,
        method: MethodToken,
        this: Option<RawValue>,
    ) -> Result<RawValue, BindingError>;

    /// Abort an in-flight funceval on a thread.
    async fn abort_eval(&self, thread_id: u32) -> Result<(), BindingError>;

    // -- raw memory / heap --

    /// Read raw target memory; a short vector signals a partial read.
    async fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>, BindingError>;

    /// Heap objects holding a reference to `address`, up to `max`.
    /// The bool is true when the walk was truncated or sampled.
    async fn inbound_references(
        &self,
        address: u64,
        max: usize,
    ) -> Result<(Vec<RawValue>, bool), BindingError>;
}
