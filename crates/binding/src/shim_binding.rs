// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-process binding over the debug shim.
//!
//! Covers the bootstrap surface the shim exposes directly: process
//! enumeration and suspended launch. The managed-interop operations
//! (breakpoints, stepping, inspection) need the runtime's COM debugging
//! interfaces, which this build surfaces as `target_runtime_error` with
//! `E_NOTIMPL` so callers get a structured, diagnosable answer instead of
//! a wedged target.

use crate::binding::RuntimeBinding;
use crate::error::BindingError;
use crate::process;
use crate::shim::{DbgShim, ResumeHandle};
use crate::types::{
    LaunchSpec, ProcessInfo, RawFrame, RawThread, RawValue, SessionHandle, StepMode, VariableSlot,
};
use async_trait::async_trait;
use ildbg_core::{DebugEvent, MethodToken};
use parking_lot::Mutex;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

const E_NOTIMPL: u32 = 0x8000_4001;

struct ShimSession {
    pid: u32,
    resume_handle: Option<ResumeHandle>,
    events: mpsc::Sender<DebugEvent>,
}

/// Production binding backed by the platform debug shim.
#[derive(Default)]
pub struct ShimBinding {
    shim: Mutex<Option<DbgShim>>,
    session: Mutex<Option<ShimSession>>,
}

impl ShimBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the shim on first use so a missing library only fails the
    /// operations that need it.
    fn shim_loaded(&self) -> Result<(), BindingError> {
        let mut guard = self.shim.lock();
        if guard.is_none() {
            *guard = Some(DbgShim::load(None)?);
        }
        Ok(())
    }

    fn with_shim<T>(
        &self,
        f: impl FnOnce(&DbgShim) -> Result<T, BindingError>,
    ) -> Result<T, BindingError> {
        self.shim_loaded()?;
        let guard = self.shim.lock();
        match guard.as_ref() {
            Some(shim) => f(shim),
            None => Err(interop_unavailable("debug shim not loaded")),
        }
    }
}

fn interop_unavailable(what: &str) -> BindingError {
    BindingError::Runtime {
        hresult: E_NOTIMPL,
        message: format!("{what}: managed debugging interop is not available in this build"),
    }
}

#[async_trait]
impl RuntimeBinding for ShimBinding {
    async fn enumerate_processes(&self) -> Result<Vec<ProcessInfo>, BindingError> {
        Ok(process::enumerate_processes())
    }

    async fn launch(
        &self,
        spec: LaunchSpec,
        events: mpsc::Sender<DebugEvent>,
    ) -> Result<SessionHandle, BindingError> {
        if self.session.lock().is_some() {
            let pid = self.session.lock().as_ref().map(|s| s.pid).unwrap_or(0);
            return Err(BindingError::AlreadyAttached(pid));
        }
        let mut command = spec.program.to_string_lossy().into_owned();
        for arg in &spec.args {
            command.push(' ');
            command.push_str(arg);
        }
        let (pid, resume_handle) = self.with_shim(|shim| {
            shim.create_process_for_launch(&command, spec.cwd.as_deref())
        })?;
        info!(pid, command = %command, "launched suspended via debug shim");

        let process_name = spec
            .program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| command.clone());
        *self.session.lock() = Some(ShimSession {
            pid,
            resume_handle: Some(resume_handle),
            events,
        });

        if !spec.stop_at_entry {
            self.resume().await?;
        }
        Ok(SessionHandle {
            pid,
            process_name,
            executable: Some(PathBuf::from(spec.program)),
            runtime_version: None,
        })
    }

    async fn attach(
        &self,
        pid: u32,
        _events: mpsc::Sender<DebugEvent>,
    ) -> Result<SessionHandle, BindingError> {
        // Attaching needs the runtime-startup registration plus the COM
        // debugging interface; surface the structured error.
        let known = process::enumerate_processes();
        let Some(target) = known.iter().find(|p| p.pid == pid) else {
            return Err(BindingError::ProcessNotFound(pid));
        };
        if !target.is_managed {
            return Err(BindingError::NotManaged(pid));
        }
        Err(interop_unavailable("attach"))
    }

    async fn detach(&self, terminate: bool) -> Result<(), BindingError> {
        let session = self.session.lock().take();
        match session {
            Some(session) => {
                if terminate {
                    warn!(pid = session.pid, "terminate requested; target left to the OS");
                }
                drop(session.events);
                Ok(())
            }
            None => Err(BindingError::NotAttached),
        }
    }

    async fn resume(&self) -> Result<(), BindingError> {
        let handle = {
            let mut guard = self.session.lock();
            match guard.as_mut() {
                Some(session) => session.resume_handle.take(),
                None => return Err(BindingError::NotAttached),
            }
        };
        match handle {
            Some(handle) => self.with_shim(|shim| {
                shim.resume_process(&handle)?;
                shim.close_resume_handle(handle)
            }),
            // Already resumed once; the cooperative continue needs interop.
            None => Err(interop_unavailable("continue")),
        }
    }

    async fn stop(&self) -> Result<(), BindingError> {
        Err(interop_unavailable("pause"))
    }

    async fn terminate(&self) -> Result<(), BindingError> {
        self.detach(true).await
    }

    async fn create_breakpoint(
        &self,
        _module_id: u64,
        _method: MethodToken,
        _il_offset: u32,
    ) -> Result<u64, BindingError> {
        Err(interop_unavailable("breakpoints"))
    }

    async fn remove_breakpoint(&self, _handle: u64) -> Result<(), BindingError> {
        Err(interop_unavailable("breakpoints"))
    }

    async fn create_step(
        &self,
        _thread_id: u32,
        _mode: StepMode,
        _il_range: Option<(u32, u32)>,
        _just_my_code: bool,
    ) -> Result<(), BindingError> {
        Err(interop_unavailable("stepping"))
    }

    async fn threads(&self) -> Result<Vec<RawThread>, BindingError> {
        Err(interop_unavailable("thread enumeration"))
    }

    async fn frames(&self, _thread_id: u32) -> Result<Vec<RawFrame>, BindingError> {
        Err(interop_unavailable("stack walking"))
    }

    async fn locals(
        &self,
        _thread_id: u32,
        _frame_index: u32,
    ) -> Result<Vec<VariableSlot>, BindingError> {
        Err(interop_unavailable("variable inspection"))
    }

    async fn read_field(
        &self,
        _value: &RawValue,
        _field: &str,
    ) -> Result<Option<RawValue>, BindingError> {
        Err(interop_unavailable("field reads"))
    }

    async fn read_element(
        &self,
        _value: &RawValue,
        _index: u32,
    ) -> Result<Option<RawValue>, BindingError> {
        Err(interop_unavailable("element reads"))
    }

    async fn object_fields(
        &self,
        _value: &RawValue,
    ) -> Result<Vec<(String, RawValue)>, BindingError> {
        Err(interop_unavailable("object inspection"))
    }

    async fn object_size(&self, _value: &RawValue) -> Result<Option<u64>, BindingError> {
        Err(interop_unavailable("object inspection"))
    }

    async fn eval_method(
        &self,
        _thread_id: u32,
        _method: MethodToken,
        _this: Option<RawValue>,
    ) -> Result<RawValue, BindingError> {
        Err(interop_unavailable("funceval"))
    }

    async fn abort_eval(&self, _thread_id: u32) -> Result<(), BindingError> {
        Ok(())
    }

    async fn read_memory(&self, _address: u64, _size: usize) -> Result<Vec<u8>, BindingError> {
        Err(interop_unavailable("memory reads"))
    }

    async fn inbound_references(
        &self,
        _address: u64,
        _max: usize,
    ) -> Result<(Vec<RawValue>, bool), BindingError> {
        Err(interop_unavailable("heap walks"))
    }
}
