// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loaded-module registry, maintained from runtime load/unload callbacks.

use ildbg_core::ModuleInfo;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<u64, ModuleInfo>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: ModuleInfo) {
        self.modules.insert(module.module_id, module);
    }

    pub fn remove(&mut self, module_id: u64) -> Option<ModuleInfo> {
        self.modules.remove(&module_id)
    }

    pub fn get(&self, module_id: u64) -> Option<&ModuleInfo> {
        self.modules.get(&module_id)
    }

    pub fn path_of(&self, module_id: u64) -> Option<&Path> {
        self.modules.get(&module_id).and_then(|m| m.path.as_deref())
    }

    /// Modules with an on-disk image, for symbol/metadata queries.
    pub fn with_paths(&self) -> Vec<(u64, PathBuf)> {
        let mut out: Vec<(u64, PathBuf)> = self
            .modules
            .values()
            .filter_map(|m| m.path.clone().map(|p| (m.module_id, p)))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    pub fn by_name(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn list(&self, include_system: bool) -> Vec<ModuleInfo> {
        let mut out: Vec<ModuleInfo> = self
            .modules
            .values()
            .filter(|m| include_system || !m.is_system())
            .cloned()
            .collect();
        out.sort_by_key(|m| m.module_id);
        out
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

#[cfg(test)]
#[path = "modules_tests.rs"]
mod tests;
