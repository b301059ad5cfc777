// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw-hit policy: hit counting, hit-count filters, conditions and
//! logpoints, plus exception-filter matching.
//!
//! The decision runs while the target is stopped inside the callback;
//! whatever the outcome, exactly one resume decision leaves this module.

use super::Engine;
use crate::error::EngineError;
use crate::notices::{StopNotice, StopReason};
use ildbg_core::{BreakpointId, Clock, MethodToken, PauseReason};
use ildbg_expr::{EvalError, Parser, ResolveContext, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Condition/logpoint context with every referenced path pre-resolved.
///
/// Pre-resolution keeps the evaluator synchronous; errors are stored and
/// only surface if evaluation actually touches the path, preserving
/// short-circuit semantics.
struct SnapshotContext {
    hit_count: u32,
    thread_id: u32,
    paths: HashMap<String, Result<Value, String>>,
}

impl ResolveContext for SnapshotContext {
    fn hit_count(&self) -> u32 {
        self.hit_count
    }

    fn thread_id(&self) -> u32 {
        self.thread_id
    }

    fn resolve_path(&self, segments: &[String]) -> Result<Value, EvalError> {
        let key = segments.join(".");
        match self.paths.get(&key) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(EvalError::MemberResolution {
                path: key,
                message: message.clone(),
            }),
            None => Err(EvalError::UnknownVariable(key)),
        }
    }
}

impl<C: Clock> Engine<C> {
    pub(super) async fn on_breakpoint_hit(
        &self,
        thread_id: u32,
        module_id: u64,
        method_token: MethodToken,
        il_offset: u32,
    ) -> Result<(), EngineError> {
        let Some((id, hit_count, condition, hit_required, log_message)) = ({
            let mut state = self.state.lock();
            let record = state.registry.find_by_site(module_id, method_token, il_offset);
            match record.map(|r| r.id.clone()) {
                Some(id) => {
                    let hit_count = state.registry.increment_hit(&id);
                    let record = state.registry.get(&id).cloned();
                    record.map(|r| (id, hit_count, r.condition, r.hit_count_required, r.log_message))
                }
                None => None,
            }
        }) else {
            debug!(module_id, token = %method_token, il_offset, "hit with no record; resuming");
            self.auto_resume().await;
            return Ok(());
        };

        // Hit-count filter: resume until the requested raw hit.
        if let Some(required) = hit_required {
            if hit_count < required {
                self.auto_resume().await;
                return Ok(());
            }
        }

        // Condition: false resumes, evaluator errors pause with the
        // message attached.
        let mut condition_error = None;
        if let Some(condition) = &condition {
            let ctx = self.snapshot_context(thread_id, hit_count, condition, None).await;
            let result = ildbg_expr::evaluate_condition(condition, &ctx);
            if result.success && !result.should_break {
                self.auto_resume().await;
                return Ok(());
            }
            if !result.success {
                warn!(id = %id, message = ?result.message, "condition evaluation failed");
                condition_error = result.message;
            }
        }

        // Logpoint: substitute, log, resume. Never pauses.
        if condition_error.is_none() {
            if let Some(template) = &log_message {
                let ctx = self.snapshot_context(thread_id, hit_count, "", Some(template)).await;
                let message = ildbg_expr::render(template, &ctx);
                info!(breakpoint = %id, thread_id, "{message}");
                self.auto_resume().await;
                return Ok(());
            }
        }

        let location = self.location_of(module_id, method_token, il_offset).await;
        let notice = StopNotice {
            reason: StopReason::Breakpoint { id: id.clone(), hit_count, condition_error },
            thread_id,
            location: location.clone(),
        };
        self.enter_paused(PauseReason::Breakpoint, thread_id, location, Some(notice));
        Ok(())
    }

    pub(super) async fn on_exception(
        &self,
        thread_id: u32,
        exception_type: String,
        type_token: Option<u32>,
        message: String,
        is_first_chance: bool,
    ) -> Result<(), EngineError> {
        let matched = self
            .match_exception_filter(&exception_type, type_token, is_first_chance)
            .await;
        let Some(id) = matched else {
            self.auto_resume().await;
            return Ok(());
        };

        self.state.lock().registry.increment_exception_hit(&id);
        let notice = StopNotice {
            reason: StopReason::Exception {
                id: id.clone(),
                exception_type,
                message,
                is_first_chance,
            },
            thread_id,
            location: None,
        };
        self.enter_paused(PauseReason::Exception, thread_id, None, Some(notice));
        Ok(())
    }

    /// First filter matching a thrown exception.
    ///
    /// `include_subtypes` walks the extends chain through metadata; without
    /// it the match is exact (by token when both sides resolve, by name
    /// otherwise).
    async fn match_exception_filter(
        &self,
        exception_type: &str,
        type_token: Option<u32>,
        is_first_chance: bool,
    ) -> Option<BreakpointId> {
        let (filters, modules) = {
            let state = self.state.lock();
            let filters: Vec<_> = state.registry.exceptions().into_iter().cloned().collect();
            (filters, state.modules.with_paths())
        };

        for filter in filters {
            let chance_matches = if is_first_chance {
                filter.break_on_first_chance
            } else {
                filter.break_on_second_chance
            };
            if !chance_matches {
                continue;
            }
            if filter.exception_type == exception_type {
                return Some(filter.id);
            }
            if !filter.include_subtypes {
                // Exact-token match only.
                if let Some(thrown) = type_token {
                    for (_, path) in &modules {
                        if let Ok(Some(token)) = self.metadata.find_type(path, &filter.exception_type)
                        {
                            if token.raw() == thrown {
                                return Some(filter.id.clone());
                            }
                        }
                    }
                }
                continue;
            }
            for (_, path) in &modules {
                match self.metadata.is_subtype(path, exception_type, &filter.exception_type) {
                    Ok(true) => return Some(filter.id.clone()),
                    _ => continue,
                }
            }
        }
        None
    }

    /// Build a pre-resolved context for a condition or logpoint template.
    async fn snapshot_context(
        &self,
        thread_id: u32,
        hit_count: u32,
        condition: &str,
        template: Option<&str>,
    ) -> SnapshotContext {
        let mut wanted = match Parser::parse(condition) {
            Ok(expr) => expr.collect_paths(),
            Err(_) => Vec::new(),
        };
        if let Some(template) = template {
            for path in ildbg_expr::template_paths(template) {
                if !wanted.contains(&path) {
                    wanted.push(path);
                }
            }
        }
        // The intrinsics resolve inside the evaluator.
        wanted.retain(|p| !(p.len() == 1 && matches!(p[0].as_str(), "hitCount" | "threadId")));

        let mut paths = HashMap::new();
        for segments in wanted {
            let key = segments.join(".");
            let resolved = self
                .resolve_value_path(thread_id, 0, &segments)
                .await
                .map(|raw| Self::project_value(&raw))
                .map_err(|e| e.to_string());
            paths.insert(key, resolved);
        }
        SnapshotContext { hit_count, thread_id, paths }
    }
}
