// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loaded-module records

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A module loaded in the target, created on `ModuleLoad` and destroyed on
/// `ModuleUnload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Stable id assigned by the binding, unique within the session.
    pub module_id: u64,
    /// Simple name, e.g. `TestTargetApp`.
    pub name: String,
    /// Full assembly name including version and culture.
    pub assembly_name: String,
    /// Null for dynamic (Reflection.Emit) modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub is_managed: bool,
    pub is_dynamic: bool,
    pub has_symbols: bool,
    pub base_address: u64,
    pub size: u64,
}

impl ModuleInfo {
    /// File basename used as the pending-breakpoint reconciliation key.
    pub fn basename(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Heuristic for `modules_list{include_system:false}` filtering.
    pub fn is_system(&self) -> bool {
        self.name == "System"
            || self.name.starts_with("System.")
            || self.name.starts_with("Microsoft.")
            || self.name == "mscorlib"
            || self.name == "netstandard"
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
