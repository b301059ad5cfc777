// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-visible error codes.
//!
//! Every tool response is either `{success:true, …}` or
//! `{error:true, code, message, details?}`. Recoverable faults (pending
//! binds, partial reads, truncated listings) are successes with flags and
//! never use these codes.

use serde::{Deserialize, Serialize};

/// Top-level error codes for tool responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotAttached,
    AlreadyAttached,
    NotManaged,
    ProcessNotFound,
    NotStopped,
    InvalidThread,
    InvalidFrame,
    InvalidBreakpoint,
    EvaluationFailed,
    Timeout,
    ProcessExited,
    NullReference,
    InvalidArgument,
    /// Wraps a native failure; `details.hresult` carries the original code.
    TargetRuntimeError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotAttached => "not_attached",
            ErrorCode::AlreadyAttached => "already_attached",
            ErrorCode::NotManaged => "not_managed",
            ErrorCode::ProcessNotFound => "process_not_found",
            ErrorCode::NotStopped => "not_stopped",
            ErrorCode::InvalidThread => "invalid_thread",
            ErrorCode::InvalidFrame => "invalid_frame",
            ErrorCode::InvalidBreakpoint => "invalid_breakpoint",
            ErrorCode::EvaluationFailed => "evaluation_failed",
            ErrorCode::Timeout => "timeout",
            ErrorCode::ProcessExited => "process_exited",
            ErrorCode::NullReference => "null_reference",
            ErrorCode::InvalidArgument => "invalid_argument",
            ErrorCode::TargetRuntimeError => "target_runtime_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subcodes for `evaluation_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalErrorKind {
    EvalTimeout,
    EvalException,
    EvalCancelled,
    SyntaxError,
    VariableUnavailable,
}

impl EvalErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EvalErrorKind::EvalTimeout => "eval_timeout",
            EvalErrorKind::EvalException => "eval_exception",
            EvalErrorKind::EvalCancelled => "eval_cancelled",
            EvalErrorKind::SyntaxError => "syntax_error",
            EvalErrorKind::VariableUnavailable => "variable_unavailable",
        }
    }
}

impl std::fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
