// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suspension notices consumed by `breakpoint_wait`-style operations.
//!
//! Every pause that a client may be blocking on is queued here by the
//! event loop; waiters drain the queue under the engine lock.

use ildbg_core::{BreakpointId, SourceLocation};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    Breakpoint {
        id: BreakpointId,
        hit_count: u32,
        /// Present when the condition evaluator failed; the hit pauses
        /// with the error attached instead of silently resuming.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition_error: Option<String>,
    },
    Exception {
        /// The filter that matched.
        id: BreakpointId,
        exception_type: String,
        message: String,
        is_first_chance: bool,
    },
    Exited {
        exit_code: i32,
    },
}

/// One entry in the suspension-event queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopNotice {
    pub reason: StopReason,
    pub thread_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl StopNotice {
    /// The breakpoint id this notice belongs to, if any.
    pub fn breakpoint_id(&self) -> Option<&BreakpointId> {
        match &self.reason {
            StopReason::Breakpoint { id, .. } | StopReason::Exception { id, .. } => Some(id),
            StopReason::Exited { .. } => None,
        }
    }
}
