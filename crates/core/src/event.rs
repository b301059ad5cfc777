// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime callback events.
//!
//! The native binding delivers these serially from the runtime's callback
//! thread; the engine consumes them on its single loop and answers each
//! suspension event with exactly one resume decision.
//!
//! Serializes with `{"type": "event:name", ...fields}` format (for event
//! logging; these never cross the MCP wire directly).

use crate::module::ModuleInfo;
use crate::tokens::MethodToken;
use serde::{Deserialize, Serialize};

/// Events that drive the engine state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DebugEvent {
    // -- modules --
    #[serde(rename = "module:load")]
    ModuleLoad { module: ModuleInfo },

    #[serde(rename = "module:unload")]
    ModuleUnload { module_id: u64 },

    // -- suspension events --
    #[serde(rename = "break:hit")]
    BreakpointHit {
        thread_id: u32,
        module_id: u64,
        method_token: MethodToken,
        il_offset: u32,
    },

    #[serde(rename = "step:complete")]
    StepComplete {
        thread_id: u32,
        module_id: u64,
        method_token: MethodToken,
        il_offset: u32,
    },

    #[serde(rename = "exception:thrown")]
    Exception {
        thread_id: u32,
        /// Full type name of the thrown exception.
        exception_type: String,
        /// TypeDef token in its defining module, when resolvable.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_token: Option<u32>,
        message: String,
        is_first_chance: bool,
    },

    /// User-injected synchronisation break (`stop`).
    #[serde(rename = "break:user")]
    UserBreak { thread_id: u32 },

    /// Stopped at the entry point of a `stop_at_entry` launch.
    #[serde(rename = "break:entry")]
    EntryBreak { thread_id: u32 },

    // -- threads --
    #[serde(rename = "thread:create")]
    CreateThread { thread_id: u32 },

    #[serde(rename = "thread:exit")]
    ExitThread { thread_id: u32 },

    #[serde(rename = "thread:name")]
    NameChange { thread_id: u32, name: String },

    // -- process --
    #[serde(rename = "process:exit")]
    ExitProcess { exit_code: i32 },
}

impl DebugEvent {
    /// Suspension events leave the target stopped until the engine resumes it.
    pub fn is_suspension(&self) -> bool {
        matches!(
            self,
            DebugEvent::BreakpointHit { .. }
                | DebugEvent::StepComplete { .. }
                | DebugEvent::Exception { .. }
                | DebugEvent::UserBreak { .. }
                | DebugEvent::EntryBreak { .. }
        )
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            DebugEvent::ModuleLoad { .. } => "module:load",
            DebugEvent::ModuleUnload { .. } => "module:unload",
            DebugEvent::BreakpointHit { .. } => "break:hit",
            DebugEvent::StepComplete { .. } => "step:complete",
            DebugEvent::Exception { .. } => "exception:thrown",
            DebugEvent::UserBreak { .. } => "break:user",
            DebugEvent::EntryBreak { .. } => "break:entry",
            DebugEvent::CreateThread { .. } => "thread:create",
            DebugEvent::ExitThread { .. } => "thread:exit",
            DebugEvent::NameChange { .. } => "thread:name",
            DebugEvent::ExitProcess { .. } => "process:exit",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
