// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// FFI into the runtime's debug shim; the one place unsafe is allowed.
#![allow(unsafe_code)]

//! Loader for the runtime's debug shim (`dbgshim`).
//!
//! The shim exposes C entry points for bootstrapping a debug session:
//! launching a suspended process, registering for runtime startup, and
//! materialising the debugging interface for a given runtime version. The
//! COM interface pointer it hands back stays opaque here; a platform
//! backend drives it behind [`crate::RuntimeBinding`].

use crate::error::BindingError;
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};

type Hresult = i32;

type CreateProcessForLaunchFn = unsafe extern "system" fn(
    command_line: *const u16,
    suspend_process: i32,
    environment: *mut c_void,
    current_directory: *const u16,
    process_id: *mut u32,
    resume_handle: *mut *mut c_void,
) -> Hresult;

type ResumeProcessFn = unsafe extern "system" fn(resume_handle: *mut c_void) -> Hresult;

type CloseResumeHandleFn = unsafe extern "system" fn(resume_handle: *mut c_void) -> Hresult;

/// Invoked by the shim once the runtime has started in the target:
/// `(cordb, parameter, hr)`.
pub type RuntimeStartupCallback =
    unsafe extern "system" fn(cordb: *mut c_void, parameter: *mut c_void, hr: Hresult);

type RegisterForRuntimeStartupFn = unsafe extern "system" fn(
    process_id: u32,
    callback: RuntimeStartupCallback,
    parameter: *mut c_void,
    unregister_token: *mut *mut c_void,
) -> Hresult;

type UnregisterForRuntimeStartupFn =
    unsafe extern "system" fn(unregister_token: *mut c_void) -> Hresult;

/// Platform library name for the shim.
#[cfg(target_os = "windows")]
const SHIM_LIBRARY: &str = "dbgshim.dll";
#[cfg(target_os = "macos")]
const SHIM_LIBRARY: &str = "libdbgshim.dylib";
#[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
const SHIM_LIBRARY: &str = "libdbgshim.so";

/// An opaque resume handle from `CreateProcessForLaunch`.
pub struct ResumeHandle(*mut c_void);

// The handle is a kernel object reference, safe to move across threads.
unsafe impl Send for ResumeHandle {}

/// An unregister token from `RegisterForRuntimeStartup`.
pub struct StartupToken(*mut c_void);

unsafe impl Send for StartupToken {}

/// Loaded debug shim.
pub struct DbgShim {
    library: Library,
}

impl DbgShim {
    /// Load the shim from an explicit path, or the platform default name
    /// via the loader search path.
    pub fn load(path: Option<&Path>) -> Result<Self, BindingError> {
        let name: PathBuf = path.map(Path::to_path_buf).unwrap_or_else(|| SHIM_LIBRARY.into());
        let library = unsafe { Library::new(&name) }.map_err(|e| {
            BindingError::LaunchFailed(format!("cannot load {}: {e}", name.display()))
        })?;
        Ok(Self { library })
    }

    /// Launch a process suspended, returning its pid and resume handle.
    pub fn create_process_for_launch(
        &self,
        command_line: &str,
        cwd: Option<&Path>,
    ) -> Result<(u32, ResumeHandle), BindingError> {
        let entry = self.symbol::<CreateProcessForLaunchFn>(b"CreateProcessForLaunch\0")?;
        let command = to_wide(command_line);
        let cwd_wide = cwd.map(|p| to_wide(&p.to_string_lossy()));
        let mut pid: u32 = 0;
        let mut handle: *mut c_void = std::ptr::null_mut();
        let hr = unsafe {
            entry(
                command.as_ptr(),
                1,
                std::ptr::null_mut(),
                cwd_wide.as_ref().map_or(std::ptr::null(), |w| w.as_ptr()),
                &mut pid,
                &mut handle,
            )
        };
        check(hr, "CreateProcessForLaunch")?;
        Ok((pid, ResumeHandle(handle)))
    }

    /// Resume a process previously launched suspended.
    pub fn resume_process(&self, handle: &ResumeHandle) -> Result<(), BindingError> {
        let entry = self.symbol::<ResumeProcessFn>(b"ResumeProcess\0")?;
        check(unsafe { entry(handle.0) }, "ResumeProcess")
    }

    /// Close a resume handle once the target is running.
    pub fn close_resume_handle(&self, handle: ResumeHandle) -> Result<(), BindingError> {
        let entry = self.symbol::<CloseResumeHandleFn>(b"CloseResumeHandle\0")?;
        check(unsafe { entry(handle.0) }, "CloseResumeHandle")
    }

    /// Register for runtime startup in the target; `callback` receives the
    /// debugging interface once the runtime initialises.
    ///
    /// # Safety
    ///
    /// `parameter` must stay valid until the callback fires or the token
    /// is unregistered.
    pub unsafe fn register_for_runtime_startup(
        &self,
        pid: u32,
        callback: RuntimeStartupCallback,
        parameter: *mut c_void,
    ) -> Result<StartupToken, BindingError> {
        let entry = self.symbol::<RegisterForRuntimeStartupFn>(b"RegisterForRuntimeStartup\0")?;
        let mut token: *mut c_void = std::ptr::null_mut();
        let hr = unsafe { entry(pid, callback, parameter, &mut token) };
        check(hr, "RegisterForRuntimeStartup")?;
        Ok(StartupToken(token))
    }

    /// Cancel a startup registration.
    pub fn unregister_for_runtime_startup(&self, token: StartupToken) -> Result<(), BindingError> {
        let entry =
            self.symbol::<UnregisterForRuntimeStartupFn>(b"UnregisterForRuntimeStartup\0")?;
        check(unsafe { entry(token.0) }, "UnregisterForRuntimeStartup")
    }

    fn symbol<T>(&self, name: &[u8]) -> Result<libloading::Symbol<'_, T>, BindingError> {
        unsafe { self.library.get::<T>(name) }.map_err(|e| BindingError::Runtime {
            hresult: 0x8007_007f, // ERROR_PROC_NOT_FOUND
            message: format!("missing shim export {}: {e}", String::from_utf8_lossy(name)),
        })
    }
}

fn check(hr: Hresult, what: &str) -> Result<(), BindingError> {
    if hr < 0 {
        return Err(BindingError::Runtime {
            hresult: hr as u32,
            message: format!("{what} failed"),
        });
    }
    Ok(())
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
