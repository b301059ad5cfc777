// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug session state

use crate::id::BreakpointId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// How the session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    Attach,
    Launch,
}

/// Why the target is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Stopped at the entry point after a `stop_at_entry` launch.
    Entry,
    Breakpoint,
    Step,
    Exception,
    /// User-injected pause (`debug_pause`).
    UserPause,
}

/// A resolved source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self { file: file.into(), line, column: None, function: None }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)?;
        if let Some(col) = self.column {
            write!(f, ":{col}")?;
        }
        Ok(())
    }
}

/// Session lifecycle.
///
/// `Disconnected → Running → Paused ↔ Running → (Disconnected | Exited)`.
/// Exactly one session exists per server process; metadata queries, funceval
/// and stack walks are legal only while `Paused`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionState {
    Disconnected,
    Running,
    Paused {
        reason: PauseReason,
        thread_id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<SourceLocation>,
        /// Set when the pause was caused by a registered breakpoint.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        breakpoint_id: Option<BreakpointId>,
    },
    Exited {
        exit_code: i32,
    },
}

impl SessionState {
    pub fn is_paused(&self) -> bool {
        matches!(self, SessionState::Paused { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused { .. })
    }

    /// Wire name for `debug_state` responses.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Running => "running",
            SessionState::Paused { .. } => "paused",
            SessionState::Exited { .. } => "exited",
        }
    }
}

/// Metadata describing the attached process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub pid: u32,
    pub process_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    pub mode: LaunchMode,
    pub attached_at_ms: u64,
    /// Launch-only metadata; empty for attach.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
