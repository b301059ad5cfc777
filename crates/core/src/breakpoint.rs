// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint records owned by the registry.
//!
//! The registry is the canonical store; the engine refers back into it by
//! id only and never holds a record across a resume.

use crate::id::BreakpointId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a source or function breakpoint was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BreakpointTarget {
    Source {
        /// Absolute path as supplied by the client.
        file: PathBuf,
        /// 1-based line.
        line: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column: Option<u32>,
    },
    Function {
        /// Fully qualified method name, e.g. `MyApp.MethodTarget.SayHello`.
        function: String,
    },
}

impl BreakpointTarget {
    /// Display string for listings and bind messages.
    pub fn describe(&self) -> String {
        match self {
            BreakpointTarget::Source { file, line, column: Some(col) } => {
                format!("{}:{}:{}", file.display(), line, col)
            }
            BreakpointTarget::Source { file, line, .. } => {
                format!("{}:{}", file.display(), line)
            }
            BreakpointTarget::Function { function } => function.clone(),
        }
    }
}

/// Engine-side binding state of a breakpoint record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindState {
    /// Requested but the containing module has not loaded.
    Pending,
    /// At least one (method token, IL offset) is bound in the engine.
    Bound,
    /// Record retained but the engine holds no active bind.
    Disabled,
}

/// A source or function breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub id: BreakpointId,
    pub target: BreakpointTarget,
    pub state: BindState,
    pub enabled: bool,
    /// True iff the registry has bound at least one location to the engine.
    pub verified: bool,
    pub hit_count: u32,
    /// Pause only when this expression evaluates to true at the hit site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Pause only on the nth satisfying hit (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_count_required: Option<u32>,
    /// Logpoint template; when present the hit logs and resumes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
    /// Informational message from the last bind attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Breakpoint {
    pub fn new(target: BreakpointTarget) -> Self {
        Self {
            id: BreakpointId::new_source(),
            target,
            state: BindState::Pending,
            enabled: true,
            verified: false,
            hit_count: 0,
            condition: None,
            hit_count_required: None,
            log_message: None,
            message: None,
        }
    }

    pub fn at_line(file: impl Into<PathBuf>, line: u32) -> Self {
        Self::new(BreakpointTarget::Source { file: file.into(), line, column: None })
    }

    pub fn at_function(function: impl Into<String>) -> Self {
        Self::new(BreakpointTarget::Function { function: function.into() })
    }
}

/// An exception breakpoint (filter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionBreakpoint {
    pub id: BreakpointId,
    /// Full exception type name, e.g. `System.InvalidOperationException`.
    pub exception_type: String,
    pub break_on_first_chance: bool,
    pub break_on_second_chance: bool,
    /// When false, matching is by exact metadata token.
    pub include_subtypes: bool,
    pub hit_count: u32,
}

impl ExceptionBreakpoint {
    pub fn new(exception_type: impl Into<String>) -> Self {
        Self {
            id: BreakpointId::new_exception(),
            exception_type: exception_type.into(),
            break_on_first_chance: true,
            break_on_second_chance: true,
            include_subtypes: true,
            hit_count: 0,
        }
    }
}

#[cfg(test)]
#[path = "breakpoint_tests.rs"]
mod tests;
