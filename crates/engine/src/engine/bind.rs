// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint binding: user intent → native IL breakpoints.
//!
//! Source targets resolve through the symbol resolver, function targets
//! through metadata. Unresolvable targets stay in the registry as Pending
//! and are re-attempted exactly once on every module load.

use super::Engine;
use crate::error::EngineError;
use crate::registry::BoundLocation;
use ildbg_core::{
    BindState, Breakpoint, BreakpointId, BreakpointTarget, Clock, ExceptionBreakpoint, ModuleInfo,
    SourceLocation,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Client request for `breakpoint_set`.
#[derive(Debug, Clone, Default)]
pub struct BreakpointSpec {
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub function: Option<String>,
    pub condition: Option<String>,
    pub hit_count: Option<u32>,
    pub log_message: Option<String>,
}

/// Result of `breakpoint_set`: pending binds are successes with
/// `verified:false` and an informational message.
#[derive(Debug, Clone, PartialEq)]
pub struct SetBreakpointOutcome {
    pub id: BreakpointId,
    pub verified: bool,
    pub message: Option<String>,
    pub location: Option<SourceLocation>,
}

impl<C: Clock> Engine<C> {
    /// Create a source or function breakpoint and attempt to bind it.
    pub async fn set_breakpoint(
        &self,
        spec: BreakpointSpec,
    ) -> Result<SetBreakpointOutcome, EngineError> {
        let target = match (&spec.file, spec.line, &spec.function) {
            (Some(file), Some(line), None) => BreakpointTarget::Source {
                file: file.clone(),
                line,
                column: spec.column,
            },
            (None, None, Some(function)) => {
                BreakpointTarget::Function { function: function.clone() }
            }
            _ => {
                return Err(EngineError::InvalidArgument(
                    "breakpoint_set needs file+line or function".to_string(),
                ));
            }
        };
        if let Some(condition) = &spec.condition {
            ildbg_expr::validate(condition)
                .map_err(|e| EngineError::InvalidArgument(format!("bad condition: {e}")))?;
        }

        let mut record = Breakpoint::new(target);
        record.condition = spec.condition;
        record.hit_count_required = spec.hit_count;
        record.log_message = spec.log_message;
        let id = record.id.clone();

        let modules = {
            let mut state = self.state.lock();
            state.registry.insert(record);
            state.modules.with_paths()
        };

        let mut location = None;
        for (module_id, path) in &modules {
            if let Some(loc) = self.try_bind(&id, *module_id, path).await? {
                location = Some(loc);
                break;
            }
        }

        let mut state = self.state.lock();
        let record = state
            .registry
            .get_mut(&id)
            .ok_or_else(|| EngineError::InvalidBreakpoint(id.to_string()))?;
        if location.is_none() {
            record.message = Some(self.pending_message(&record.target, &modules));
        }
        let outcome = SetBreakpointOutcome {
            id: id.clone(),
            verified: record.verified,
            message: record.message.clone(),
            location,
        };
        info!(id = %id, verified = outcome.verified, "breakpoint set");
        Ok(outcome)
    }

    /// Why a breakpoint could not bind yet, with a nearest-line hint when
    /// the document is known but the line holds no code.
    fn pending_message(&self, target: &BreakpointTarget, modules: &[(u64, PathBuf)]) -> String {
        if let BreakpointTarget::Source { file, line, .. } = target {
            for (_, path) in modules {
                if let Ok(Some(nearest)) = self.symbols.nearest_valid_line(path, file, *line, 10) {
                    if nearest != *line {
                        return format!(
                            "no executable code at line {line}; nearest valid line is {nearest}"
                        );
                    }
                }
            }
        }
        "pending: containing module not loaded".to_string()
    }

    /// Try to bind one registry record against one module. Returns the
    /// bound source location on success.
    async fn try_bind(
        &self,
        id: &BreakpointId,
        module_id: u64,
        path: &Path,
    ) -> Result<Option<SourceLocation>, EngineError> {
        let target = {
            let state = self.state.lock();
            match state.registry.get(id) {
                Some(record) if record.enabled => record.target.clone(),
                _ => return Ok(None),
            }
        };

        let resolved = match &target {
            BreakpointTarget::Source { file, line, column } => {
                match self.symbols.find_il_offset(path, file, *line, *column) {
                    Ok(Some(loc)) => Some((
                        loc.method_token,
                        loc.il_offset,
                        SourceLocation {
                            file: file.clone(),
                            line: loc.span.start_line,
                            column: Some(loc.span.start_col),
                            function: None,
                        },
                    )),
                    Ok(None) => None,
                    Err(e) => {
                        debug!(module = %path.display(), error = %e, "resolver miss");
                        None
                    }
                }
            }
            BreakpointTarget::Function { function } => {
                match self.metadata.find_method(path, function) {
                    Ok(Some(token)) => Some((
                        token,
                        0,
                        SourceLocation {
                            file: path.to_path_buf(),
                            line: 0,
                            column: None,
                            function: Some(function.clone()),
                        },
                    )),
                    _ => None,
                }
            }
        };

        let Some((method_token, il_offset, location)) = resolved else {
            return Ok(None);
        };

        let handle = self
            .binding
            .create_breakpoint(module_id, method_token, il_offset)
            .await?;
        let mut state = self.state.lock();
        state.registry.record_bind(
            id,
            BoundLocation { handle, module_id, method_token, il_offset },
        );
        debug!(id = %id, module_id, token = %method_token, il_offset, "breakpoint bound");
        Ok(Some(location))
    }

    /// Module-load reconciliation: re-attempt every pending record once.
    pub(super) async fn on_module_load(&self, module: ModuleInfo) -> Result<(), EngineError> {
        let (pending, path) = {
            let mut state = self.state.lock();
            state.modules.insert(module.clone());
            (state.registry.pending(), module.path.clone())
        };
        let Some(path) = path else {
            return Ok(());
        };
        for id in pending {
            match self.try_bind(&id, module.module_id, &path).await {
                Ok(Some(_)) => info!(id = %id, module = %module.name, "pending breakpoint bound"),
                Ok(None) => {}
                Err(e) => warn!(id = %id, error = %e, "pending bind attempt failed"),
            }
        }
        Ok(())
    }

    /// Module unload: drop caches and return affected binds to Pending.
    pub(super) fn on_module_unload(&self, module_id: u64) -> Result<(), EngineError> {
        let (module, changed) = {
            let mut state = self.state.lock();
            let module = state.modules.remove(module_id);
            let changed = state.registry.unbind_module(module_id);
            (module, changed)
        };
        if let Some(path) = module.as_ref().and_then(|m| m.path.as_deref()) {
            self.symbols.invalidate(path);
            self.metadata.invalidate(path);
        }
        if !changed.is_empty() {
            info!(module_id, count = changed.len(), "breakpoints returned to pending");
        }
        Ok(())
    }

    /// Remove a breakpoint (source, function or exception) by id.
    pub async fn remove_breakpoint(&self, id: &BreakpointId) -> Result<(), EngineError> {
        if id.is_exception() {
            let removed = self.state.lock().registry.remove_exception(id);
            return match removed {
                Some(_) => Ok(()),
                None => Err(EngineError::InvalidBreakpoint(id.to_string())),
            };
        }
        let binds = {
            let mut state = self.state.lock();
            match state.registry.remove(id) {
                Some((_, binds)) => binds,
                None => return Err(EngineError::InvalidBreakpoint(id.to_string())),
            }
        };
        self.remove_native_binds(binds).await;
        Ok(())
    }

    /// Enable/disable. Disable removes the native binds but keeps the
    /// record; enable re-binds. Idempotent in both directions.
    pub async fn enable_breakpoint(
        &self,
        id: &BreakpointId,
        enabled: bool,
    ) -> Result<Breakpoint, EngineError> {
        let (needs_unbind, needs_bind, modules) = {
            let mut state = self.state.lock();
            let record = state
                .registry
                .get_mut(id)
                .ok_or_else(|| EngineError::InvalidBreakpoint(id.to_string()))?;
            let was_enabled = record.enabled;
            record.enabled = enabled;
            if !enabled && was_enabled {
                record.state = BindState::Disabled;
                record.verified = false;
                (true, false, Vec::new())
            } else if enabled && !was_enabled {
                record.state = BindState::Pending;
                (false, true, state.modules.with_paths())
            } else {
                (false, false, Vec::new())
            }
        };

        if needs_unbind {
            let binds = self.state.lock().registry.take_binds(id);
            self.remove_native_binds(binds).await;
        }
        if needs_bind {
            for (module_id, path) in modules {
                if self.try_bind(id, module_id, &path).await?.is_some() {
                    break;
                }
            }
        }

        let state = self.state.lock();
        state
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::InvalidBreakpoint(id.to_string()))
    }

    async fn remove_native_binds(&self, binds: Vec<BoundLocation>) {
        for bind in binds {
            if let Err(e) = self.binding.remove_breakpoint(bind.handle).await {
                debug!(handle = bind.handle, error = %e, "native unbind failed");
            }
        }
    }

    /// All source/function records.
    pub fn list_breakpoints(&self) -> Vec<Breakpoint> {
        self.state.lock().registry.list().into_iter().cloned().collect()
    }

    /// All exception filters.
    pub fn list_exception_breakpoints(&self) -> Vec<ExceptionBreakpoint> {
        self.state.lock().registry.exceptions().into_iter().cloned().collect()
    }

    /// Register an exception filter.
    pub fn set_exception_breakpoint(
        &self,
        exception_type: String,
        break_on_first_chance: bool,
        break_on_second_chance: bool,
        include_subtypes: bool,
    ) -> BreakpointId {
        let mut filter = ExceptionBreakpoint::new(exception_type);
        filter.break_on_first_chance = break_on_first_chance;
        filter.break_on_second_chance = break_on_second_chance;
        filter.include_subtypes = include_subtypes;
        let id = self.state.lock().registry.insert_exception(filter);
        info!(id = %id, "exception breakpoint set");
        id
    }
}
