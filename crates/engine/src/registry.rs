// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint registry: the canonical store of user breakpoints.
//!
//! The registry owns the records; the engine holds native bind handles
//! against them by id and reconciles pending records on module load.

use ildbg_core::{BindState, Breakpoint, BreakpointId, ExceptionBreakpoint, MethodToken};
use std::collections::HashMap;

/// One native binding of a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundLocation {
    pub handle: u64,
    pub module_id: u64,
    pub method_token: MethodToken,
    pub il_offset: u32,
}

#[derive(Default)]
pub struct BreakpointRegistry {
    source: HashMap<BreakpointId, Breakpoint>,
    exceptions: HashMap<BreakpointId, ExceptionBreakpoint>,
    binds: HashMap<BreakpointId, Vec<BoundLocation>>,
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- source/function records --

    pub fn insert(&mut self, breakpoint: Breakpoint) -> BreakpointId {
        let id = breakpoint.id.clone();
        self.source.insert(id.clone(), breakpoint);
        id
    }

    pub fn get(&self, id: &BreakpointId) -> Option<&Breakpoint> {
        self.source.get(id)
    }

    pub fn get_mut(&mut self, id: &BreakpointId) -> Option<&mut Breakpoint> {
        self.source.get_mut(id)
    }

    /// Remove a record, returning its binds for engine-side teardown.
    pub fn remove(&mut self, id: &BreakpointId) -> Option<(Breakpoint, Vec<BoundLocation>)> {
        let record = self.source.remove(id)?;
        let binds = self.binds.remove(id).unwrap_or_default();
        Some((record, binds))
    }

    pub fn list(&self) -> Vec<&Breakpoint> {
        let mut out: Vec<&Breakpoint> = self.source.values().collect();
        out.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        out
    }

    /// Records still waiting for their module.
    pub fn pending(&self) -> Vec<BreakpointId> {
        let mut out: Vec<BreakpointId> = self
            .source
            .values()
            .filter(|bp| bp.enabled && bp.state == BindState::Pending)
            .map(|bp| bp.id.clone())
            .collect();
        out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        out
    }

    // -- binds --

    /// Record a successful native bind and mark the record verified.
    pub fn record_bind(&mut self, id: &BreakpointId, bind: BoundLocation) {
        self.binds.entry(id.clone()).or_default().push(bind);
        if let Some(bp) = self.source.get_mut(id) {
            bp.state = BindState::Bound;
            bp.verified = true;
            bp.message = None;
        }
    }

    /// Drop all binds of a record, returning them for native removal.
    pub fn take_binds(&mut self, id: &BreakpointId) -> Vec<BoundLocation> {
        self.binds.remove(id).unwrap_or_default()
    }

    pub fn binds(&self, id: &BreakpointId) -> &[BoundLocation] {
        self.binds.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The record bound at a hit site.
    pub fn find_by_site(
        &self,
        module_id: u64,
        method_token: MethodToken,
        il_offset: u32,
    ) -> Option<&Breakpoint> {
        self.binds
            .iter()
            .find(|(_, binds)| {
                binds.iter().any(|b| {
                    b.module_id == module_id
                        && b.method_token == method_token
                        && b.il_offset == il_offset
                })
            })
            .and_then(|(id, _)| self.source.get(id))
    }

    /// Move every bind in `module_id` back to pending (module unload).
    /// Returns the ids that changed.
    pub fn unbind_module(&mut self, module_id: u64) -> Vec<BreakpointId> {
        let mut changed = Vec::new();
        for (id, binds) in self.binds.iter_mut() {
            let before = binds.len();
            binds.retain(|b| b.module_id != module_id);
            if binds.len() != before && binds.is_empty() {
                changed.push(id.clone());
            }
        }
        for id in &changed {
            self.binds.remove(id);
            if let Some(bp) = self.source.get_mut(id) {
                bp.state = BindState::Pending;
                bp.verified = false;
                bp.message = Some("module unloaded".to_string());
            }
        }
        changed
    }

    /// Increment and return the record's hit count.
    pub fn increment_hit(&mut self, id: &BreakpointId) -> u32 {
        match self.source.get_mut(id) {
            Some(bp) => {
                bp.hit_count += 1;
                bp.hit_count
            }
            None => 0,
        }
    }

    // -- exception records --

    pub fn insert_exception(&mut self, filter: ExceptionBreakpoint) -> BreakpointId {
        let id = filter.id.clone();
        self.exceptions.insert(id.clone(), filter);
        id
    }

    pub fn remove_exception(&mut self, id: &BreakpointId) -> Option<ExceptionBreakpoint> {
        self.exceptions.remove(id)
    }

    pub fn exceptions(&self) -> Vec<&ExceptionBreakpoint> {
        let mut out: Vec<&ExceptionBreakpoint> = self.exceptions.values().collect();
        out.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        out
    }

    pub fn increment_exception_hit(&mut self, id: &BreakpointId) -> u32 {
        match self.exceptions.get_mut(id) {
            Some(filter) => {
                filter.hit_count += 1;
                filter.hit_count
            }
            None => 0,
        }
    }

    /// Session teardown: drop everything.
    pub fn clear(&mut self) -> Vec<BoundLocation> {
        let binds = self.binds.drain().flat_map(|(_, b)| b).collect();
        self.source.clear();
        self.exceptions.clear();
        binds
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
