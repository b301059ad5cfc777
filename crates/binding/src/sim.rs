// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scripted in-memory managed target.
//!
//! `SimTarget` implements [`RuntimeBinding`] over a declared program: a
//! module list, an execution trace of IL positions, an object heap and
//! funceval behaviors. Engine and server tests drive the full
//! attach → bind → hit → inspect → resume cycle against it without a real
//! runtime on the machine.
//!
//! The trace only advances when the target is driven: `run()` models the
//! target doing work (e.g. a request arriving); `resume()` continues
//! after a suspension. Both stop at the next suspension event, exactly
//! like the runtime's cooperative continue.

use crate::binding::RuntimeBinding;
use crate::error::BindingError;
use crate::types::{
    LaunchSpec, ProcessInfo, RawFrame, RawThread, RawValue, SessionHandle, SlotKind, StepMode,
    VariableSlot,
};
use async_trait::async_trait;
use ildbg_core::{DebugEvent, MethodToken, ModuleInfo};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// One step of the scripted execution trace.
#[derive(Debug, Clone)]
pub struct TracePoint {
    pub thread_id: u32,
    pub module_id: u64,
    pub method_token: MethodToken,
    pub il_offset: u32,
    /// Stack depth, for step-over/step-out semantics.
    pub depth: u32,
    pub function_name: String,
    /// Locals/arguments visible while stopped here (frame 0).
    pub locals: Vec<VariableSlot>,
    /// Explicit stack; when empty, a single frame is synthesised.
    pub frames: Vec<RawFrame>,
    /// Reaching this point throws instead of executing.
    pub exception: Option<SimException>,
}

#[derive(Debug, Clone)]
pub struct SimException {
    pub exception_type: String,
    pub message: String,
    pub type_token: Option<u32>,
}

impl TracePoint {
    pub fn new(module_id: u64, method_token: MethodToken, il_offset: u32) -> Self {
        Self {
            thread_id: 1,
            module_id,
            method_token,
            il_offset,
            depth: 1,
            function_name: String::new(),
            locals: Vec::new(),
            frames: Vec::new(),
            exception: None,
        }
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn function(mut self, name: &str) -> Self {
        self.function_name = name.to_string();
        self
    }

    pub fn local(mut self, name: &str, value: RawValue) -> Self {
        self.locals.push(VariableSlot {
            name: name.to_string(),
            kind: SlotKind::Local,
            value,
        });
        self
    }

    pub fn argument(mut self, name: &str, value: RawValue) -> Self {
        self.locals.push(VariableSlot {
            name: name.to_string(),
            kind: SlotKind::Argument,
            value,
        });
        self
    }

    pub fn this(mut self, value: RawValue) -> Self {
        self.locals.push(VariableSlot {
            name: "this".to_string(),
            kind: SlotKind::This,
            value,
        });
        self
    }

    pub fn frames(mut self, frames: Vec<RawFrame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn throws(mut self, exception_type: &str, message: &str, type_token: Option<u32>) -> Self {
        self.exception = Some(SimException {
            exception_type: exception_type.to_string(),
            message: message.to_string(),
            type_token,
        });
        self
    }
}

/// An object on the simulated heap.
#[derive(Debug, Clone)]
pub struct SimObject {
    pub type_name: String,
    pub fields: Vec<(String, RawValue)>,
    pub size: u64,
}

/// What a funceval of a method token does.
#[derive(Debug, Clone)]
pub enum EvalBehavior {
    Return(RawValue),
    /// Read a field off the receiver.
    ReadField(String),
    Throw { exception_type: String, message: String },
    /// Never completes; only `abort_eval` releases it.
    Hang,
}

/// Declarative description of the simulated target.
pub struct SimProgram {
    pub pid: u32,
    pub process_name: String,
    pub executable: Option<PathBuf>,
    pub runtime_version: String,
    pub is_managed: bool,
    pub modules: Vec<ModuleInfo>,
    pub trace: Vec<TracePoint>,
    pub objects: HashMap<u64, SimObject>,
    pub evals: HashMap<u32, EvalBehavior>,
    pub memory: HashMap<u64, Vec<u8>>,
    pub exit_code: i32,
}

impl SimProgram {
    pub fn new(pid: u32, process_name: &str) -> Self {
        Self {
            pid,
            process_name: process_name.to_string(),
            executable: None,
            runtime_version: "8.0.11".to_string(),
            is_managed: true,
            modules: Vec::new(),
            trace: Vec::new(),
            objects: HashMap::new(),
            evals: HashMap::new(),
            memory: HashMap::new(),
            exit_code: 0,
        }
    }

    pub fn module(mut self, module: ModuleInfo) -> Self {
        self.modules.push(module);
        self
    }

    pub fn point(mut self, point: TracePoint) -> Self {
        self.trace.push(point);
        self
    }

    pub fn object(mut self, address: u64, object: SimObject) -> Self {
        self.objects.insert(address, object);
        self
    }

    pub fn eval(mut self, method: MethodToken, behavior: EvalBehavior) -> Self {
        self.evals.insert(method.raw(), behavior);
        self
    }

    pub fn memory_region(mut self, address: u64, bytes: Vec<u8>) -> Self {
        self.memory.insert(address, bytes);
        self
    }

    pub fn not_managed(mut self) -> Self {
        self.is_managed = false;
        self
    }
}

/// Convenience constructor for a user-code module.
pub fn sim_module(module_id: u64, name: &str, path: &str) -> ModuleInfo {
    ModuleInfo {
        module_id,
        name: name.to_string(),
        assembly_name: format!("{name}, Version=1.0.0.0, Culture=neutral"),
        path: Some(PathBuf::from(path)),
        version: Some("1.0.0.0".to_string()),
        is_managed: true,
        is_dynamic: false,
        has_symbols: true,
        base_address: 0x7f80_0000_0000 + module_id * 0x10_0000,
        size: 0x8_0000,
    }
}

struct Armed {
    thread_id: u32,
    mode: StepMode,
    il_range: Option<(u32, u32)>,
    method_token: MethodToken,
    depth: u32,
}

#[derive(Default)]
struct SimState {
    attached: bool,
    exited: bool,
    suspended: bool,
    events: Option<mpsc::Sender<DebugEvent>>,
    breakpoints: HashMap<u64, (u64, u32, u32)>,
    next_handle: u64,
    pos: usize,
    step: Option<Armed>,
    aborted_evals: HashSet<u32>,
    attach_count: u32,
    detach_count: u32,
}

/// The scripted target.
pub struct SimTarget {
    program: Mutex<SimProgram>,
    state: Arc<Mutex<SimState>>,
}

impl SimTarget {
    pub fn new(program: SimProgram) -> Self {
        Self { program: Mutex::new(program), state: Arc::new(Mutex::new(SimState::default())) }
    }

    /// Drive the target: execute trace points until a suspension event or
    /// the end of the program. Models target-side activity while the
    /// session is Running.
    pub async fn run(&self) {
        let (sender, events) = self.advance();
        deliver(sender, events).await;
    }

    // -- test introspection --

    pub fn attach_count(&self) -> u32 {
        self.state.lock().attach_count
    }

    pub fn detach_count(&self) -> u32 {
        self.state.lock().detach_count
    }

    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    pub fn bound_breakpoint_count(&self) -> usize {
        self.state.lock().breakpoints.len()
    }

    /// Rewind the trace so the same script can run again.
    pub fn rewind(&self) {
        let mut state = self.state.lock();
        state.pos = 0;
        state.exited = false;
    }

    /// Emit a module unload callback.
    pub async fn unload_module(&self, module_id: u64) {
        let sender = self.state.lock().events.clone();
        deliver(sender, vec![DebugEvent::ModuleUnload { module_id }]).await;
    }

    /// Patch an object's field (e.g. force `_currentUser = null`).
    pub fn set_object_field(&self, address: u64, field: &str, value: RawValue) {
        let mut program = self.program.lock();
        if let Some(object) = program.objects.get_mut(&address) {
            for (name, slot) in &mut object.fields {
                if name == field {
                    *slot = value;
                    return;
                }
            }
            object.fields.push((field.to_string(), value));
        }
    }

    /// Core trace walk. Returns the events to deliver after the lock drops.
    fn advance(&self) -> (Option<mpsc::Sender<DebugEvent>>, Vec<DebugEvent>) {
        let program = self.program.lock();
        let mut state = self.state.lock();
        if !state.attached || state.exited || state.suspended {
            return (state.events.clone(), Vec::new());
        }

        let mut out = Vec::new();
        while state.pos < program.trace.len() {
            let point = &program.trace[state.pos];
            state.pos += 1;

            if let Some(exception) = &point.exception {
                state.suspended = true;
                out.push(DebugEvent::Exception {
                    thread_id: point.thread_id,
                    exception_type: exception.exception_type.clone(),
                    type_token: exception.type_token,
                    message: exception.message.clone(),
                    is_first_chance: true,
                });
                break;
            }

            let hit = state
                .breakpoints
                .values()
                .find(|(module, token, il)| {
                    *module == point.module_id
                        && *token == point.method_token.raw()
                        && *il == point.il_offset
                })
                .copied();
            if let Some((module_id, token, il_offset)) = hit {
                state.suspended = true;
                state.step = None;
                out.push(DebugEvent::BreakpointHit {
                    thread_id: point.thread_id,
                    module_id,
                    method_token: MethodToken(token),
                    il_offset,
                });
                break;
            }

            let step_done = match &state.step {
                Some(armed) if armed.thread_id == point.thread_id => match armed.mode {
                    StepMode::Into => !in_armed_range(armed, point),
                    StepMode::Over => point.depth <= armed.depth && !in_armed_range(armed, point),
                    StepMode::Out => point.depth < armed.depth,
                },
                _ => false,
            };
            if step_done {
                state.suspended = true;
                state.step = None;
                out.push(DebugEvent::StepComplete {
                    thread_id: point.thread_id,
                    module_id: point.module_id,
                    method_token: point.method_token,
                    il_offset: point.il_offset,
                });
                break;
            }
        }

        if state.pos >= program.trace.len() && !state.suspended {
            state.exited = true;
            out.push(DebugEvent::ExitProcess { exit_code: program.exit_code });
        }
        (state.events.clone(), out)
    }

    /// The trace point the target is currently stopped at.
    fn current_point<'a>(&self, program: &'a SimProgram, state: &SimState) -> Option<&'a TracePoint> {
        if state.pos == 0 {
            return None;
        }
        program.trace.get(state.pos - 1)
    }

    fn require_attached(state: &SimState) -> Result<(), BindingError> {
        if state.exited {
            return Err(BindingError::ProcessExited);
        }
        if !state.attached {
            return Err(BindingError::NotAttached);
        }
        Ok(())
    }

    fn require_stopped(state: &SimState) -> Result<(), BindingError> {
        Self::require_attached(state)?;
        if !state.suspended {
            return Err(BindingError::NotStopped);
        }
        Ok(())
    }

    fn resolve_composite<'a>(
        program: &'a SimProgram,
        value: &RawValue,
    ) -> Result<&'a SimObject, BindingError> {
        let address = value.address().ok_or(BindingError::ReadFailed { address: 0 })?;
        program
            .objects
            .get(&address)
            .ok_or(BindingError::ReadFailed { address })
    }
}

fn in_armed_range(armed: &Armed, point: &TracePoint) -> bool {
    if point.method_token != armed.method_token || point.depth != armed.depth {
        return false;
    }
    match armed.il_range {
        Some((start, end)) => point.il_offset >= start && point.il_offset < end,
        None => false,
    }
}

async fn deliver(sender: Option<mpsc::Sender<DebugEvent>>, events: Vec<DebugEvent>) {
    if let Some(sender) = sender {
        for event in events {
            if sender.send(event).await.is_err() {
                break;
            }
        }
    }
}

#[async_trait]
impl RuntimeBinding for SimTarget {
    async fn enumerate_processes(&self) -> Result<Vec<ProcessInfo>, BindingError> {
        let program = self.program.lock();
        Ok(vec![ProcessInfo {
            pid: program.pid,
            name: program.process_name.clone(),
            executable: program.executable.clone(),
            is_managed: program.is_managed,
        }])
    }

    async fn launch(
        &self,
        spec: LaunchSpec,
        events: mpsc::Sender<DebugEvent>,
    ) -> Result<SessionHandle, BindingError> {
        let handle = {
            let mut program = self.program.lock();
            let mut state = self.state.lock();
            if state.attached {
                return Err(BindingError::AlreadyAttached(program.pid));
            }
            program.executable = Some(spec.program.clone());
            state.attached = true;
            state.exited = false;
            state.attach_count += 1;
            state.events = Some(events);
            SessionHandle {
                pid: program.pid,
                process_name: program.process_name.clone(),
                executable: Some(spec.program),
                runtime_version: Some(program.runtime_version.clone()),
            }
        };

        let (sender, startup) = {
            let program = self.program.lock();
            let mut state = self.state.lock();
            let mut events: Vec<DebugEvent> = program
                .modules
                .iter()
                .map(|m| DebugEvent::ModuleLoad { module: m.clone() })
                .collect();
            events.push(DebugEvent::CreateThread { thread_id: 1 });
            if spec.stop_at_entry {
                state.suspended = true;
                events.push(DebugEvent::EntryBreak { thread_id: 1 });
            }
            (state.events.clone(), events)
        };
        deliver(sender, startup).await;
        Ok(handle)
    }

    async fn attach(
        &self,
        pid: u32,
        events: mpsc::Sender<DebugEvent>,
    ) -> Result<SessionHandle, BindingError> {
        let handle = {
            let program = self.program.lock();
            let mut state = self.state.lock();
            if state.attached {
                return Err(BindingError::AlreadyAttached(program.pid));
            }
            if pid != program.pid {
                return Err(BindingError::ProcessNotFound(pid));
            }
            if !program.is_managed {
                return Err(BindingError::NotManaged(pid));
            }
            state.attached = true;
            state.exited = false;
            state.suspended = false;
            state.attach_count += 1;
            state.events = Some(events);
            SessionHandle {
                pid: program.pid,
                process_name: program.process_name.clone(),
                executable: program.executable.clone(),
                runtime_version: Some(program.runtime_version.clone()),
            }
        };

        let (sender, events) = {
            let program = self.program.lock();
            let state = self.state.lock();
            let mut out: Vec<DebugEvent> = program
                .modules
                .iter()
                .map(|m| DebugEvent::ModuleLoad { module: m.clone() })
                .collect();
            out.push(DebugEvent::CreateThread { thread_id: 1 });
            (state.events.clone(), out)
        };
        deliver(sender, events).await;
        Ok(handle)
    }

    async fn detach(&self, terminate: bool) -> Result<(), BindingError> {
        let mut state = self.state.lock();
        if !state.attached {
            return Err(BindingError::NotAttached);
        }
        state.attached = false;
        state.suspended = false;
        state.events = None;
        state.breakpoints.clear();
        state.step = None;
        state.detach_count += 1;
        if terminate {
            state.exited = true;
        }
        Ok(())
    }

    async fn resume(&self) -> Result<(), BindingError> {
        {
            let mut state = self.state.lock();
            Self::require_attached(&state)?;
            state.suspended = false;
        }
        let (sender, events) = self.advance();
        deliver(sender, events).await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), BindingError> {
        let (sender, events) = {
            let program = self.program.lock();
            let mut state = self.state.lock();
            Self::require_attached(&state)?;
            if state.suspended {
                return Ok(());
            }
            state.suspended = true;
            let thread_id = self
                .current_point(&program, &state)
                .map(|p| p.thread_id)
                .unwrap_or(1);
            (state.events.clone(), vec![DebugEvent::UserBreak { thread_id }])
        };
        deliver(sender, events).await;
        Ok(())
    }

    async fn terminate(&self) -> Result<(), BindingError> {
        let mut state = self.state.lock();
        state.exited = true;
        state.suspended = false;
        Ok(())
    }

    async fn create_breakpoint(
        &self,
        module_id: u64,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<u64, BindingError> {
        let mut state = self.state.lock();
        Self::require_attached(&state)?;
        state.next_handle += 1;
        let handle = state.next_handle;
        state.breakpoints.insert(handle, (module_id, method.raw(), il_offset));
        Ok(handle)
    }

    async fn remove_breakpoint(&self, handle: u64) -> Result<(), BindingError> {
        let mut state = self.state.lock();
        state
            .breakpoints
            .remove(&handle)
            .map(|_| ())
            .ok_or(BindingError::UnknownBreakpoint(handle))
    }

    async fn create_step(
        &self,
        thread_id: u32,
        mode: StepMode,
        il_range: Option<(u32, u32)>,
        _just_my_code: bool,
    ) -> Result<(), BindingError> {
        let program = self.program.lock();
        let mut state = self.state.lock();
        Self::require_stopped(&state)?;
        let (method_token, depth) = self
            .current_point(&program, &state)
            .map(|p| (p.method_token, p.depth))
            .unwrap_or((MethodToken(0), 0));
        state.step = Some(Armed { thread_id, mode, il_range, method_token, depth });
        Ok(())
    }

    async fn threads(&self) -> Result<Vec<RawThread>, BindingError> {
        let program = self.program.lock();
        let state = self.state.lock();
        Self::require_attached(&state)?;
        let mut ids: Vec<u32> = program.trace.iter().map(|p| p.thread_id).collect();
        ids.push(1);
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .map(|thread_id| RawThread {
                thread_id,
                name: (thread_id == 1).then(|| "Main".to_string()),
                is_stopped: state.suspended,
                is_waiting: false,
            })
            .collect())
    }

    async fn frames(&self, thread_id: u32) -> Result<Vec<RawFrame>, BindingError> {
        let program = self.program.lock();
        let state = self.state.lock();
        Self::require_stopped(&state)?;
        let point = self
            .current_point(&program, &state)
            .ok_or(BindingError::NotStopped)?;
        if point.thread_id != thread_id {
            return Err(BindingError::InvalidThread(thread_id));
        }
        if !point.frames.is_empty() {
            return Ok(point.frames.clone());
        }
        Ok(vec![RawFrame {
            index: 0,
            module_id: point.module_id,
            method_token: point.method_token,
            il_offset: point.il_offset,
            function_name: Some(point.function_name.clone()),
            is_external: false,
        }])
    }

    async fn locals(
        &self,
        thread_id: u32,
        frame_index: u32,
    ) -> Result<Vec<VariableSlot>, BindingError> {
        let program = self.program.lock();
        let state = self.state.lock();
        Self::require_stopped(&state)?;
        let point = self
            .current_point(&program, &state)
            .ok_or(BindingError::NotStopped)?;
        if point.thread_id != thread_id {
            return Err(BindingError::InvalidThread(thread_id));
        }
        let frame_count = point.frames.len().max(1) as u32;
        if frame_index >= frame_count {
            return Err(BindingError::InvalidFrame { thread: thread_id, frame: frame_index });
        }
        if frame_index == 0 {
            Ok(point.locals.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn read_field(
        &self,
        value: &RawValue,
        field: &str,
    ) -> Result<Option<RawValue>, BindingError> {
        let program = self.program.lock();
        let object = Self::resolve_composite(&program, value)?;
        Ok(object
            .fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v.clone()))
    }

    async fn read_element(
        &self,
        value: &RawValue,
        index: u32,
    ) -> Result<Option<RawValue>, BindingError> {
        let program = self.program.lock();
        let object = Self::resolve_composite(&program, value)?;
        Ok(object.fields.get(index as usize).map(|(_, v)| v.clone()))
    }

    async fn object_fields(
        &self,
        value: &RawValue,
    ) -> Result<Vec<(String, RawValue)>, BindingError> {
        let program = self.program.lock();
        Ok(Self::resolve_composite(&program, value)?.fields.clone())
    }

    async fn object_size(&self, value: &RawValue) -> Result<Option<u64>, BindingError> {
        let program = self.program.lock();
        Ok(Some(Self::resolve_composite(&program, value)?.size))
    }

    async fn eval_method(
        &self,
        thread_id: u32,
        method: MethodToken,
        this: Option<RawValue>,
    ) -> Result<RawValue, BindingError> {
        let behavior = {
            let program = self.program.lock();
            let mut state = self.state.lock();
            Self::require_stopped(&state)?;
            state.aborted_evals.remove(&thread_id);
            program.evals.get(&method.raw()).cloned()
        };
        match behavior {
            Some(EvalBehavior::Return(value)) => Ok(value),
            Some(EvalBehavior::ReadField(field)) => {
                let receiver = this.ok_or(BindingError::ReadFailed { address: 0 })?;
                let program = self.program.lock();
                let object = Self::resolve_composite(&program, &receiver)?;
                object
                    .fields
                    .iter()
                    .find(|(name, _)| *name == field)
                    .map(|(_, v)| Ok(v.clone()))
                    .unwrap_or(Ok(RawValue::Null))
            }
            Some(EvalBehavior::Throw { exception_type, message }) => {
                Err(BindingError::EvalException { exception_type, message })
            }
            Some(EvalBehavior::Hang) => {
                // Spin until aborted; bounded so a broken test cannot hang.
                for _ in 0..1000 {
                    if self.state.lock().aborted_evals.remove(&thread_id) {
                        return Err(BindingError::EvalAborted);
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(BindingError::EvalAborted)
            }
            None => Err(BindingError::EvalException {
                exception_type: "System.MissingMethodException".to_string(),
                message: format!("no eval target for {method}"),
            }),
        }
    }

    async fn abort_eval(&self, thread_id: u32) -> Result<(), BindingError> {
        self.state.lock().aborted_evals.insert(thread_id);
        Ok(())
    }

    async fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>, BindingError> {
        let program = self.program.lock();
        for (start, bytes) in &program.memory {
            let end = start + bytes.len() as u64;
            if address >= *start && address < end {
                let offset = (address - start) as usize;
                let available = bytes.len() - offset;
                return Ok(bytes[offset..offset + available.min(size)].to_vec());
            }
        }
        Err(BindingError::ReadFailed { address })
    }

    async fn inbound_references(
        &self,
        address: u64,
        max: usize,
    ) -> Result<(Vec<RawValue>, bool), BindingError> {
        let program = self.program.lock();
        let mut holders = Vec::new();
        for (holder_address, object) in &program.objects {
            let refers = object
                .fields
                .iter()
                .any(|(_, value)| value.address() == Some(address));
            if refers {
                holders.push(RawValue::Object {
                    address: *holder_address,
                    type_name: object.type_name.clone(),
                });
            }
        }
        holders.sort_by_key(|v| v.address());
        let truncated = holders.len() > max;
        holders.truncate(max);
        Ok((holders, truncated))
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
