// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The debug engine: a single-loop state machine owning the target session.
//!
//! All state lives behind one lock; runtime callbacks arrive on a channel
//! and are consumed serially by [`Engine::run_events`], which applies the
//! transition and issues exactly one resume decision per suspension event.
//! Tool-surface operations take the lock briefly, never across an await
//! of the binding.

mod bind;
mod hit;
mod inspect;

pub use bind::{BreakpointSpec, SetBreakpointOutcome};
pub use inspect::EvaluateOutcome;

use crate::error::EngineError;
use crate::modules::ModuleRegistry;
use crate::notices::{StopNotice, StopReason};
use crate::registry::BreakpointRegistry;
use ildbg_binding::{LaunchSpec, ProcessInfo, RawValue, RuntimeBinding, StepMode};
use ildbg_core::{
    Clock, DebugEvent, LaunchMode, MethodToken, PauseReason, SessionInfo, SessionState,
    SourceLocation,
};
use ildbg_symbols::{MetadataSource, SymbolSource};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Engine tunables, sourced from the server's environment module.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Funceval deadline; expiry aborts the eval in the target.
    pub eval_timeout: Duration,
    /// Default just-my-code flag for steppers.
    pub just_my_code: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { eval_timeout: Duration::from_millis(5000), just_my_code: true }
    }
}

/// Everything behind the engine's single lock.
struct EngineState {
    session: SessionState,
    info: Option<SessionInfo>,
    modules: ModuleRegistry,
    registry: BreakpointRegistry,
    /// Suspension-event queue drained by `wait_for_hit`.
    queue: VecDeque<StopNotice>,
    thread_names: HashMap<u32, String>,
    active_thread: u32,
    /// Bumped on every resume; outstanding frame references die with it.
    generation: u64,
}

impl EngineState {
    fn new() -> Self {
        Self {
            session: SessionState::Disconnected,
            info: None,
            modules: ModuleRegistry::new(),
            registry: BreakpointRegistry::new(),
            queue: VecDeque::new(),
            thread_names: HashMap::new(),
            active_thread: 1,
            generation: 0,
        }
    }

    fn require_attached(&self) -> Result<(), EngineError> {
        match &self.session {
            SessionState::Disconnected => Err(EngineError::NotAttached),
            SessionState::Exited { .. } => Err(EngineError::ProcessExited),
            _ => Ok(()),
        }
    }

    fn require_paused(&self) -> Result<(), EngineError> {
        self.require_attached()?;
        if !self.session.is_paused() {
            return Err(EngineError::NotStopped);
        }
        Ok(())
    }
}

/// The debug engine.
pub struct Engine<C: Clock> {
    binding: Arc<dyn RuntimeBinding>,
    symbols: Arc<dyn SymbolSource>,
    metadata: Arc<dyn MetadataSource>,
    clock: C,
    config: EngineConfig,
    state: Mutex<EngineState>,
    /// Wakes `wait_for_hit` when the queue gains an entry.
    stop_signal: Notify,
    events_tx: mpsc::Sender<DebugEvent>,
}

/// Dependencies injected into the engine (mirrors the adapter seams).
pub struct EngineDeps {
    pub binding: Arc<dyn RuntimeBinding>,
    pub symbols: Arc<dyn SymbolSource>,
    pub metadata: Arc<dyn MetadataSource>,
}

impl<C: Clock> Engine<C> {
    /// Create the engine and the callback receiver to hand to
    /// [`Engine::run_events`].
    pub fn new(
        deps: EngineDeps,
        clock: C,
        config: EngineConfig,
    ) -> (Arc<Self>, mpsc::Receiver<DebugEvent>) {
        let (events_tx, events_rx) = mpsc::channel(256);
        let engine = Arc::new(Self {
            binding: deps.binding,
            symbols: deps.symbols,
            metadata: deps.metadata,
            clock,
            config,
            state: Mutex::new(EngineState::new()),
            stop_signal: Notify::new(),
            events_tx,
        });
        (engine, events_rx)
    }

    /// Consume runtime callbacks until the channel closes. Spawned once
    /// at startup; survives attach/detach cycles.
    pub async fn run_events(self: Arc<Self>, mut events: mpsc::Receiver<DebugEvent>) {
        while let Some(event) = events.recv().await {
            debug!(event = event.name(), "runtime callback");
            if let Err(e) = self.handle_event(event).await {
                // Callbacks that error log and resume; never leave the
                // target wedged.
                error!(error = %e, "callback handling failed");
                let _ = self.binding.resume().await;
            }
        }
    }

    async fn handle_event(&self, event: DebugEvent) -> Result<(), EngineError> {
        match event {
            DebugEvent::ModuleLoad { module } => self.on_module_load(module).await,
            DebugEvent::ModuleUnload { module_id } => self.on_module_unload(module_id),
            DebugEvent::BreakpointHit { thread_id, module_id, method_token, il_offset } => {
                self.on_breakpoint_hit(thread_id, module_id, method_token, il_offset).await
            }
            DebugEvent::StepComplete { thread_id, module_id, method_token, il_offset } => {
                let location = self.location_of(module_id, method_token, il_offset).await;
                self.enter_paused(PauseReason::Step, thread_id, location, None);
                Ok(())
            }
            DebugEvent::Exception {
                thread_id,
                exception_type,
                type_token,
                message,
                is_first_chance,
            } => {
                self.on_exception(thread_id, exception_type, type_token, message, is_first_chance)
                    .await
            }
            DebugEvent::UserBreak { thread_id } => {
                self.enter_paused(PauseReason::UserPause, thread_id, None, None);
                Ok(())
            }
            DebugEvent::EntryBreak { thread_id } => {
                self.enter_paused(PauseReason::Entry, thread_id, None, None);
                Ok(())
            }
            DebugEvent::CreateThread { thread_id } => {
                self.state.lock().thread_names.entry(thread_id).or_default();
                Ok(())
            }
            DebugEvent::ExitThread { thread_id } => {
                self.state.lock().thread_names.remove(&thread_id);
                Ok(())
            }
            DebugEvent::NameChange { thread_id, name } => {
                self.state.lock().thread_names.insert(thread_id, name);
                Ok(())
            }
            DebugEvent::ExitProcess { exit_code } => {
                self.on_exit_process(exit_code);
                Ok(())
            }
        }
    }

    /// Apply a pause transition and record the suspension.
    fn enter_paused(
        &self,
        reason: PauseReason,
        thread_id: u32,
        location: Option<SourceLocation>,
        notice: Option<StopNotice>,
    ) {
        let mut state = self.state.lock();
        state.session = SessionState::Paused {
            reason,
            thread_id,
            location,
            breakpoint_id: notice.as_ref().and_then(|n| n.breakpoint_id().cloned()),
        };
        state.active_thread = thread_id;
        if let Some(notice) = notice {
            state.queue.push_back(notice);
        }
        drop(state);
        self.stop_signal.notify_one();
    }

    fn on_exit_process(&self, exit_code: i32) {
        info!(exit_code, "target exited");
        let mut state = self.state.lock();
        state.session = SessionState::Exited { exit_code };
        state.modules.clear();
        state.queue.push_back(StopNotice {
            reason: StopReason::Exited { exit_code },
            thread_id: 0,
            location: None,
        });
        drop(state);
        self.stop_signal.notify_one();
    }

    /// Best-effort source location for an IL position.
    pub(crate) async fn location_of(
        &self,
        module_id: u64,
        method_token: MethodToken,
        il_offset: u32,
    ) -> Option<SourceLocation> {
        let path = {
            let state = self.state.lock();
            state.modules.path_of(module_id).map(|p| p.to_path_buf())
        }?;
        let function = self
            .metadata
            .method_name(&path, method_token)
            .ok()
            .flatten();
        match self.symbols.location_for_offset(&path, method_token, il_offset) {
            Ok(Some((file, span))) => Some(SourceLocation {
                file,
                line: span.start_line,
                column: Some(span.start_col),
                function,
            }),
            _ => None,
        }
    }

    // -- session lifecycle --

    /// Attach to a running process.
    pub async fn attach(&self, pid: u32) -> Result<SessionInfo, EngineError> {
        {
            let state = self.state.lock();
            if state.session.is_attached() {
                return Err(EngineError::AlreadyAttached(
                    state.info.as_ref().map(|i| i.pid).unwrap_or(pid),
                ));
            }
        }
        let handle = self.binding.attach(pid, self.events_tx.clone()).await?;
        let info = SessionInfo {
            pid: handle.pid,
            process_name: handle.process_name,
            executable: handle.executable,
            runtime_version: handle.runtime_version,
            mode: LaunchMode::Attach,
            attached_at_ms: self.clock.epoch_ms(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
        };
        let mut state = self.state.lock();
        state.session = SessionState::Running;
        state.info = Some(info.clone());
        state.queue.clear();
        info!(pid, "attached");
        Ok(info)
    }

    /// Launch a process under the debugger.
    pub async fn launch(&self, spec: LaunchSpec) -> Result<SessionInfo, EngineError> {
        {
            let state = self.state.lock();
            if state.session.is_attached() {
                return Err(EngineError::AlreadyAttached(
                    state.info.as_ref().map(|i| i.pid).unwrap_or(0),
                ));
            }
        }
        let stop_at_entry = spec.stop_at_entry;
        let info_spec = (spec.program.clone(), spec.args.clone(), spec.cwd.clone(), spec.env.clone());
        let handle = self.binding.launch(spec, self.events_tx.clone()).await?;
        let info = SessionInfo {
            pid: handle.pid,
            process_name: handle.process_name,
            executable: handle.executable,
            runtime_version: handle.runtime_version,
            mode: LaunchMode::Launch,
            attached_at_ms: self.clock.epoch_ms(),
            args: info_spec.1,
            cwd: info_spec.2,
            env: info_spec.3,
        };
        let mut state = self.state.lock();
        // A stop-at-entry pause may already have been applied by the event
        // loop; do not clobber it.
        if !state.session.is_paused() {
            state.session = SessionState::Running;
        }
        state.info = Some(info.clone());
        info!(pid = info.pid, stop_at_entry, "launched");
        Ok(info)
    }

    /// Disconnect, optionally terminating the target. Always succeeds in
    /// releasing engine state so a fresh attach is possible.
    pub async fn disconnect(&self, terminate: bool) -> Result<(), EngineError> {
        let was_attached = {
            let state = self.state.lock();
            state.session.is_attached() || matches!(state.session, SessionState::Exited { .. })
        };
        if was_attached {
            match self.binding.detach(terminate).await {
                Ok(()) => {}
                Err(ildbg_binding::BindingError::Runtime { hresult, message })
                    if hresult == ildbg_binding::CORDBG_E_ILLEGAL_SHUTDOWN_ORDER =>
                {
                    // Known shutdown-order fault; swallowed so teardown
                    // always completes, but kept visible in the log.
                    warn!(hresult = %format!("0x{hresult:08x}"), %message, "detach fault swallowed");
                }
                Err(ildbg_binding::BindingError::NotAttached) => {}
                Err(e) => warn!(error = %e, "detach reported an error"),
            }
        }
        let mut state = self.state.lock();
        state.registry.clear();
        state.modules.clear();
        state.queue.clear();
        state.thread_names.clear();
        state.session = SessionState::Disconnected;
        state.info = None;
        state.generation += 1;
        info!(terminate, "disconnected");
        Ok(())
    }

    // -- execution control --

    /// Resume from a paused state.
    pub async fn resume(&self) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock();
            state.require_paused()?;
            state.session = SessionState::Running;
            state.generation += 1;
        }
        self.binding.resume().await?;
        Ok(())
    }

    /// Inject a pause into a running target.
    pub async fn pause(&self) -> Result<(), EngineError> {
        {
            let state = self.state.lock();
            state.require_attached()?;
            if state.session.is_paused() {
                return Ok(());
            }
        }
        self.binding.stop().await?;
        Ok(())
    }

    /// Step by source line on a thread.
    pub async fn step(&self, mode: StepMode, thread_id: Option<u32>) -> Result<(), EngineError> {
        let thread = {
            let state = self.state.lock();
            state.require_paused()?;
            thread_id.unwrap_or(state.active_thread)
        };
        let frames = self.binding.frames(thread).await?;
        let top = frames.first().ok_or(EngineError::InvalidThread(thread))?;

        let il_range = {
            let path = {
                let state = self.state.lock();
                state.modules.path_of(top.module_id).map(|p| p.to_path_buf())
            };
            match path {
                Some(path) => self
                    .symbols
                    .step_range(&path, top.method_token, top.il_offset)
                    .unwrap_or(None),
                None => None,
            }
        };

        self.binding
            .create_step(thread, mode, il_range, self.config.just_my_code)
            .await?;
        {
            let mut state = self.state.lock();
            state.session = SessionState::Running;
            state.generation += 1;
        }
        self.binding.resume().await?;
        Ok(())
    }

    /// Resume after a suspension event the engine decided not to surface.
    pub(crate) async fn auto_resume(&self) {
        if let Err(e) = self.binding.resume().await {
            error!(error = %e, "auto-resume failed; target may be wedged");
        }
    }

    // -- waits --

    /// Block until a breakpoint or exception hit (or process exit), with a
    /// precise timeout. With `filter` set, hits for other breakpoints are
    /// drained, logged and dropped.
    pub async fn wait_for_hit(
        &self,
        timeout: Duration,
        filter: Option<&ildbg_core::BreakpointId>,
        cancel: &CancellationToken,
    ) -> WaitOutcome {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut state = self.state.lock();
                while let Some(notice) = state.queue.pop_front() {
                    let matches = match (&notice.reason, filter) {
                        (StopReason::Exited { .. }, _) => true,
                        (_, None) => true,
                        (_, Some(wanted)) => notice.breakpoint_id() == Some(wanted),
                    };
                    if matches {
                        return WaitOutcome::Hit(notice);
                    }
                    debug!(
                        dropped = ?notice.breakpoint_id().map(|id| id.to_string()),
                        "dropping hit for non-awaited breakpoint"
                    );
                }
            }
            let woken = self.stop_signal.notified();
            tokio::select! {
                _ = woken => {}
                _ = tokio::time::sleep_until(deadline) => return WaitOutcome::TimedOut,
                _ = cancel.cancelled() => return WaitOutcome::Cancelled,
            }
        }
    }

    // -- introspection --

    /// Current session state and metadata for `debug_state`.
    pub fn snapshot(&self) -> (SessionState, Option<SessionInfo>) {
        let state = self.state.lock();
        (state.session.clone(), state.info.clone())
    }

    pub fn active_thread(&self) -> u32 {
        self.state.lock().active_thread
    }

    /// Host processes, for attach targeting.
    pub async fn processes(&self) -> Result<Vec<ProcessInfo>, EngineError> {
        Ok(self.binding.enumerate_processes().await?)
    }

    /// Project a binding value into the expression lattice for condition
    /// evaluation and computed expressions.
    pub(crate) fn project_value(value: &RawValue) -> ildbg_expr::Value {
        match value {
            RawValue::Null => ildbg_expr::Value::Null,
            RawValue::Bool(b) => ildbg_expr::Value::Bool(*b),
            RawValue::Char(c) => ildbg_expr::Value::Str(c.to_string()),
            RawValue::I8(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::U8(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::I16(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::U16(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::I32(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::U32(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::I64(n) => ildbg_expr::Value::Int(*n),
            RawValue::U64(n) => ildbg_expr::Value::Int(*n as i64),
            RawValue::F32(n) => ildbg_expr::Value::Float(*n as f64),
            RawValue::F64(n) => ildbg_expr::Value::Float(*n),
            RawValue::Str(s) => ildbg_expr::Value::Str(s.clone()),
            RawValue::Object { .. } | RawValue::Struct { .. } | RawValue::Array { .. } => {
                // Composites only support null-comparison; anything else
                // fails with a type mismatch downstream.
                ildbg_expr::Value::Str(value.display())
            }
        }
    }
}

/// Outcome of `wait_for_hit`.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Hit(StopNotice),
    TimedOut,
    Cancelled,
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
