// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! Every failure maps to one of the wire error codes; native faults keep
//! the original HRESULT in `details` for diagnosis.

use ildbg_binding::BindingError;
use ildbg_core::{ErrorCode, EvalErrorKind};
use ildbg_symbols::SymbolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no process attached")]
    NotAttached,

    #[error("already attached to process {0}")]
    AlreadyAttached(u32),

    #[error("process {0} is not running a managed runtime")]
    NotManaged(u32),

    #[error("process {0} not found")]
    ProcessNotFound(u32),

    #[error("target is not stopped")]
    NotStopped,

    #[error("unknown thread {0}")]
    InvalidThread(u32),

    #[error("invalid frame index {0}")]
    InvalidFrame(u32),

    #[error("unknown breakpoint {0}")]
    InvalidBreakpoint(String),

    #[error("target process has exited")]
    ProcessExited,

    #[error("null reference while resolving '{0}'")]
    NullReference(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("operation timed out")]
    Timeout,

    #[error("evaluation failed ({kind}): {message}")]
    Eval {
        kind: EvalErrorKind,
        message: String,
        exception_type: Option<String>,
    },

    #[error(transparent)]
    Symbols(#[from] SymbolError),

    #[error("runtime error 0x{hresult:08x}: {message}")]
    Runtime { hresult: u32, message: String },
}

impl EngineError {
    /// Wire error code for the tool-surface envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::NotAttached => ErrorCode::NotAttached,
            EngineError::AlreadyAttached(_) => ErrorCode::AlreadyAttached,
            EngineError::NotManaged(_) => ErrorCode::NotManaged,
            EngineError::ProcessNotFound(_) => ErrorCode::ProcessNotFound,
            EngineError::NotStopped => ErrorCode::NotStopped,
            EngineError::InvalidThread(_) => ErrorCode::InvalidThread,
            EngineError::InvalidFrame(_) => ErrorCode::InvalidFrame,
            EngineError::InvalidBreakpoint(_) => ErrorCode::InvalidBreakpoint,
            EngineError::ProcessExited => ErrorCode::ProcessExited,
            EngineError::NullReference(_) => ErrorCode::NullReference,
            EngineError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            EngineError::Timeout => ErrorCode::Timeout,
            EngineError::Eval { .. } => ErrorCode::EvaluationFailed,
            EngineError::Symbols(_) => ErrorCode::InvalidArgument,
            EngineError::Runtime { .. } => ErrorCode::TargetRuntimeError,
        }
    }

    /// Subcode for `evaluation_failed` errors.
    pub fn eval_kind(&self) -> Option<EvalErrorKind> {
        match self {
            EngineError::Eval { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn eval_exception(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Eval {
            kind: EvalErrorKind::EvalException,
            message: message.into(),
            exception_type: Some(exception_type.into()),
        }
    }

    pub fn variable_unavailable(message: impl Into<String>) -> Self {
        EngineError::Eval {
            kind: EvalErrorKind::VariableUnavailable,
            message: message.into(),
            exception_type: None,
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        EngineError::Eval {
            kind: EvalErrorKind::SyntaxError,
            message: message.into(),
            exception_type: None,
        }
    }
}

impl From<BindingError> for EngineError {
    fn from(e: BindingError) -> Self {
        match e {
            BindingError::ProcessNotFound(pid) => EngineError::ProcessNotFound(pid),
            BindingError::NotManaged(pid) => EngineError::NotManaged(pid),
            BindingError::AlreadyAttached(pid) => EngineError::AlreadyAttached(pid),
            BindingError::NotAttached => EngineError::NotAttached,
            BindingError::NotStopped => EngineError::NotStopped,
            BindingError::InvalidThread(id) => EngineError::InvalidThread(id),
            BindingError::InvalidFrame { frame, .. } => EngineError::InvalidFrame(frame),
            BindingError::UnknownBreakpoint(handle) => {
                EngineError::InvalidBreakpoint(format!("bind handle {handle}"))
            }
            BindingError::ProcessExited => EngineError::ProcessExited,
            BindingError::LaunchFailed(message) => EngineError::InvalidArgument(message),
            BindingError::EvalException { exception_type, message } => {
                EngineError::eval_exception(exception_type, message)
            }
            BindingError::EvalAborted => EngineError::Eval {
                kind: EvalErrorKind::EvalCancelled,
                message: "funceval aborted".to_string(),
                exception_type: None,
            },
            BindingError::ReadFailed { address } => EngineError::Runtime {
                hresult: 0x8013_1c49,
                message: format!("memory read failed at 0x{address:x}"),
            },
            BindingError::Runtime { hresult, message } => {
                EngineError::Runtime { hresult, message }
            }
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
