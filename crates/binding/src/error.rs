// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from the native debug binding.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("process {0} not found")]
    ProcessNotFound(u32),

    #[error("process {0} is not running a managed runtime")]
    NotManaged(u32),

    #[error("already attached to process {0}")]
    AlreadyAttached(u32),

    #[error("no process attached")]
    NotAttached,

    #[error("target is not stopped")]
    NotStopped,

    #[error("unknown thread {0}")]
    InvalidThread(u32),

    #[error("frame {frame} out of range for thread {thread}")]
    InvalidFrame { thread: u32, frame: u32 },

    #[error("no such breakpoint binding {0}")]
    UnknownBreakpoint(u64),

    #[error("target process exited")]
    ProcessExited,

    #[error("launch failed: {0}")]
    LaunchFailed(String),

    #[error("funceval threw {exception_type}: {message}")]
    EvalException { exception_type: String, message: String },

    #[error("funceval aborted")]
    EvalAborted,

    #[error("memory read failed at 0x{address:x}")]
    ReadFailed { address: u64 },

    /// Native failure with the original HRESULT preserved for diagnosis.
    #[error("runtime error 0x{hresult:08x}: {message}")]
    Runtime { hresult: u32, message: String },
}

/// The HRESULT the runtime returns when shutdown is requested in the
/// wrong order. `terminate` maps it to success at warn level.
pub const CORDBG_E_ILLEGAL_SHUTDOWN_ORDER: u32 = 0x8013_1c33;
