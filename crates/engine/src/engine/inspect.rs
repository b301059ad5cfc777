// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paused-target inspection: threads, stacks, variables, expression
//! evaluation, heap/memory reads and module browsing.
//!
//! Member resolution policy, in order: declared field, auto-property
//! backing field (`<Name>k__BackingField`), property getter via funceval,
//! then up the base-type chain until `System.Object`.

use super::Engine;
use crate::error::EngineError;
use ildbg_binding::{RawValue, SlotKind, VariableSlot};
use ildbg_core::{
    Clock, EvalErrorKind, FrameInfo, InspectedField, MemberKind, MemoryRegion, MethodToken,
    ModuleInfo, ObjectInspection, ObjectReference, ReferenceDirection, ReferencesResult,
    SearchHit, SearchKind, ThreadInfo, ThreadState, TypeLayout, TypeMember, TypeSummary,
    Variable, VariableScope,
};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// `evaluate` result.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateOutcome {
    pub result: String,
    pub type_name: String,
    pub has_children: bool,
    pub children: Vec<Variable>,
}

const MAX_CHILDREN: usize = 100;
const ROOT_OBJECT: &str = "System.Object";

impl<C: Clock> Engine<C> {
    // -- threads and stacks --

    pub async fn threads(&self) -> Result<Vec<ThreadInfo>, EngineError> {
        let (active, names) = {
            let state = self.state.lock();
            state.require_attached()?;
            (state.active_thread, state.thread_names.clone())
        };
        let raw = self.binding.threads().await?;
        Ok(raw
            .into_iter()
            .map(|t| ThreadInfo {
                thread_id: t.thread_id,
                name: names
                    .get(&t.thread_id)
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .or(t.name),
                state: if t.is_waiting {
                    ThreadState::Waiting
                } else if t.is_stopped {
                    ThreadState::Stopped
                } else {
                    ThreadState::Running
                },
                is_current: t.thread_id == active,
            })
            .collect())
    }

    pub async fn stacktrace(
        &self,
        thread_id: Option<u32>,
        start_frame: u32,
        max_frames: u32,
    ) -> Result<Vec<FrameInfo>, EngineError> {
        let thread = {
            let state = self.state.lock();
            state.require_paused()?;
            thread_id.unwrap_or(state.active_thread)
        };
        let raw = self.binding.frames(thread).await?;
        let mut out = Vec::new();
        for frame in raw
            .into_iter()
            .skip(start_frame as usize)
            .take(max_frames as usize)
        {
            let location = if frame.is_external {
                None
            } else {
                self.location_of(frame.module_id, frame.method_token, frame.il_offset)
                    .await
            };
            let module = {
                let state = self.state.lock();
                state.modules.get(frame.module_id).map(|m| m.name.clone())
            };
            let function = location
                .as_ref()
                .and_then(|l| l.function.clone())
                .or_else(|| frame.function_name.clone())
                .unwrap_or_else(|| format!("{}!{}", frame.module_id, frame.method_token));
            let arguments = match self.binding.locals(thread, frame.index).await {
                Ok(slots) => slots
                    .iter()
                    .filter(|s| s.kind == SlotKind::Argument)
                    .map(|s| format!("{}={}", s.name, s.value.display()))
                    .collect(),
                Err(_) => Vec::new(),
            };
            out.push(FrameInfo {
                index: frame.index,
                function,
                module,
                location,
                is_external: frame.is_external,
                arguments,
            });
        }
        Ok(out)
    }

    // -- variables --

    /// `variables_get`: frame slots, or children of `expand`.
    pub async fn variables(
        &self,
        thread_id: Option<u32>,
        frame_index: u32,
        scope: Option<VariableScope>,
        expand: Option<&str>,
    ) -> Result<Vec<Variable>, EngineError> {
        let thread = {
            let state = self.state.lock();
            state.require_paused()?;
            thread_id.unwrap_or(state.active_thread)
        };

        match expand {
            None => {
                let slots = self.binding.locals(thread, frame_index).await?;
                Ok(slots
                    .into_iter()
                    .map(|slot| slot_to_variable(&slot))
                    .filter(|v| scope.is_none_or(|s| v.scope == s))
                    .collect())
            }
            Some(path) => {
                let segments = parse_path(path)?;
                let value = self.resolve_value_path(thread, frame_index, &segments).await?;
                self.children_of(&value, path).await
            }
        }
    }

    /// Children of a composite value, each carrying its expansion path.
    async fn children_of(
        &self,
        value: &RawValue,
        base_path: &str,
    ) -> Result<Vec<Variable>, EngineError> {
        if !value.has_children() {
            return Ok(Vec::new());
        }
        let fields = self.binding.object_fields(value).await?;
        Ok(fields
            .into_iter()
            .take(MAX_CHILDREN)
            .map(|(name, value)| {
                let mut variable = raw_to_variable(&name, &value, VariableScope::Field);
                variable.expand_path =
                    value.has_children().then(|| format!("{base_path}.{name}"));
                variable
            })
            .collect())
    }

    // -- path resolution --

    /// Resolve a dotted path starting from the frame's slots.
    pub(crate) async fn resolve_value_path(
        &self,
        thread_id: u32,
        frame_index: u32,
        segments: &[String],
    ) -> Result<RawValue, EngineError> {
        let Some((root, rest)) = segments.split_first() else {
            return Err(EngineError::InvalidArgument("empty expression".to_string()));
        };

        let slots = self.binding.locals(thread_id, frame_index).await?;
        let mut current = slots
            .iter()
            .find(|s| match root.as_str() {
                "this" => s.kind == SlotKind::This,
                name => s.name == name,
            })
            .map(|s| s.value.clone())
            .ok_or_else(|| {
                EngineError::variable_unavailable(format!("no variable named '{root}'"))
            })?;

        let mut walked = root.clone();
        for segment in rest {
            if matches!(current, RawValue::Null) {
                return Err(EngineError::NullReference(walked));
            }
            current = self.resolve_member(thread_id, &current, segment).await?;
            walked = format!("{walked}.{segment}");
        }
        Ok(current)
    }

    /// One step of the member-resolution policy.
    pub(crate) async fn resolve_member(
        &self,
        thread_id: u32,
        value: &RawValue,
        name: &str,
    ) -> Result<RawValue, EngineError> {
        if !value.has_children() {
            return Err(EngineError::variable_unavailable(format!(
                "'{}' has no member '{name}'",
                value.type_name()
            )));
        }

        // Declared field.
        if let Some(found) = self.binding.read_field(value, name).await? {
            return Ok(found);
        }
        // Auto-property backing field.
        let backing = format!("<{name}>k__BackingField");
        if let Some(found) = self.binding.read_field(value, &backing).await? {
            return Ok(found);
        }
        // Property getter via funceval, walking the base chain.
        let modules = {
            let state = self.state.lock();
            state.modules.with_paths()
        };
        let mut type_name = value.type_name();
        for _ in 0..64 {
            for (_, path) in &modules {
                if let Ok(Some(getter)) = self.metadata.property_getter(path, &type_name, name) {
                    return self.funceval(thread_id, getter, Some(value.clone())).await;
                }
            }
            let mut next = None;
            for (_, path) in &modules {
                if let Ok(Some(base)) = self.metadata.base_type_name(path, &type_name) {
                    next = Some(base);
                    break;
                }
            }
            match next {
                Some(base) if base != ROOT_OBJECT => type_name = base,
                _ => break,
            }
        }

        Err(EngineError::variable_unavailable(format!(
            "'{name}' not found on {}",
            value.type_name()
        )))
    }

    /// Funceval bounded by the configured timeout; expiry aborts the eval
    /// in the target. The binding itself enforces that the thread is
    /// stopped, which also covers evaluation inside breakpoint callbacks
    /// before the session transition lands.
    pub(crate) async fn funceval(
        &self,
        thread_id: u32,
        method: MethodToken,
        this: Option<RawValue>,
    ) -> Result<RawValue, EngineError> {
        let call = self.binding.eval_method(thread_id, method, this);
        match tokio::time::timeout(self.config.eval_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                debug!(thread_id, method = %method, "funceval deadline; aborting");
                let _ = self.binding.abort_eval(thread_id).await;
                Err(EngineError::Eval {
                    kind: EvalErrorKind::EvalTimeout,
                    message: format!(
                        "funceval did not complete within {}ms",
                        self.config.eval_timeout.as_millis()
                    ),
                    exception_type: None,
                })
            }
        }
    }

    // -- evaluate --

    pub async fn evaluate(
        &self,
        expression: &str,
        thread_id: Option<u32>,
        frame_index: u32,
    ) -> Result<EvaluateOutcome, EngineError> {
        let thread = {
            let state = self.state.lock();
            state.require_paused()?;
            thread_id.unwrap_or(state.active_thread)
        };

        let expr = ildbg_expr::Parser::parse(expression)
            .map_err(|e| EngineError::syntax_error(e.to_string()))?;

        // A bare path keeps its rich runtime value.
        if let Some(segments) = expr.as_path() {
            if !(segments.len() == 1
                && matches!(segments[0].as_str(), "hitCount" | "threadId"))
            {
                let value = self
                    .resolve_value_path(thread, frame_index, segments)
                    .await?;
                let children = self.children_of(&value, expression).await?;
                return Ok(EvaluateOutcome {
                    result: value.display(),
                    type_name: value.type_name(),
                    has_children: value.has_children(),
                    children,
                });
            }
        }

        // Computed expression: resolve every referenced path, then fold.
        let mut paths = std::collections::HashMap::new();
        for segments in expr.collect_paths() {
            if segments.len() == 1 && matches!(segments[0].as_str(), "hitCount" | "threadId") {
                continue;
            }
            let key = segments.join(".");
            let resolved = self
                .resolve_value_path(thread, frame_index, &segments)
                .await
                .map(|raw| Self::project_value(&raw))
                .map_err(|e| e.to_string());
            paths.insert(key, resolved);
        }
        struct Ctx {
            thread_id: u32,
            paths: std::collections::HashMap<String, Result<ildbg_expr::Value, String>>,
        }
        impl ildbg_expr::ResolveContext for Ctx {
            fn hit_count(&self) -> u32 {
                0
            }
            fn thread_id(&self) -> u32 {
                self.thread_id
            }
            fn resolve_path(
                &self,
                segments: &[String],
            ) -> Result<ildbg_expr::Value, ildbg_expr::EvalError> {
                let key = segments.join(".");
                match self.paths.get(&key) {
                    Some(Ok(value)) => Ok(value.clone()),
                    Some(Err(message)) => Err(ildbg_expr::EvalError::MemberResolution {
                        path: key,
                        message: message.clone(),
                    }),
                    None => Err(ildbg_expr::EvalError::UnknownVariable(key)),
                }
            }
        }
        let ctx = Ctx { thread_id: thread, paths };
        let value = ildbg_expr::evaluate(&expr, &ctx)
            .map_err(|e| EngineError::variable_unavailable(e.to_string()))?;
        let (result, type_name) = match &value {
            ildbg_expr::Value::Null => ("null".to_string(), "null".to_string()),
            ildbg_expr::Value::Bool(b) => (b.to_string(), "System.Boolean".to_string()),
            ildbg_expr::Value::Int(n) => (n.to_string(), "System.Int32".to_string()),
            ildbg_expr::Value::Float(n) => (n.to_string(), "System.Double".to_string()),
            ildbg_expr::Value::Str(s) => (format!("{s:?}"), "System.String".to_string()),
        };
        Ok(EvaluateOutcome { result, type_name, has_children: false, children: Vec::new() })
    }

    // -- heap / memory / layout --

    pub async fn object_inspect(
        &self,
        expression: &str,
        depth: u32,
        max_fields: usize,
    ) -> Result<ObjectInspection, EngineError> {
        let thread = {
            let state = self.state.lock();
            state.require_paused()?;
            state.active_thread
        };
        let segments = parse_path(expression)?;
        let value = self.resolve_value_path(thread, 0, &segments).await?;

        if matches!(value, RawValue::Null) {
            return Ok(ObjectInspection {
                address: format_address(0),
                type_name: "null".to_string(),
                value: None,
                size: 0,
                fields: Vec::new(),
                is_null: true,
                has_circular_ref: false,
                truncated: false,
            });
        }

        if !value.has_children() {
            return Ok(ObjectInspection {
                address: format_address(0),
                type_name: value.type_name(),
                value: Some(value.display()),
                size: 0,
                fields: Vec::new(),
                is_null: false,
                has_circular_ref: false,
                truncated: false,
            });
        }

        let mut visited = HashSet::new();
        if let Some(address) = value.address() {
            visited.insert(address);
        }
        let mut circular = false;
        let mut truncated = false;
        let fields = self
            .inspect_value(&value, depth, max_fields, &mut visited, &mut circular, &mut truncated)
            .await?;
        let size = self.binding.object_size(&value).await?.unwrap_or(0);
        Ok(ObjectInspection {
            address: format_address(value.address().unwrap_or(0)),
            type_name: value.type_name(),
            value: None,
            size,
            fields,
            is_null: false,
            has_circular_ref: circular,
            truncated,
        })
    }

    /// Object-graph walk with cycle detection keyed by target address.
    /// `depth` counts levels of children below `value`.
    fn inspect_value<'a>(
        &'a self,
        value: &'a RawValue,
        depth: u32,
        max_fields: usize,
        visited: &'a mut HashSet<u64>,
        circular: &'a mut bool,
        truncated: &'a mut bool,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<InspectedField>, EngineError>> + Send + 'a>,
    > {
        Box::pin(async move {
            let fields = self.binding.object_fields(value).await?;
            if fields.len() > max_fields {
                *truncated = true;
            }
            let mut out = Vec::new();
            for (name, child) in fields.into_iter().take(max_fields) {
                let mut row = InspectedField {
                    name,
                    type_name: child.type_name(),
                    value: child.display(),
                    children: None,
                };
                if child.has_children() && depth > 0 {
                    match child.address() {
                        Some(address) if !visited.insert(address) => *circular = true,
                        _ => {
                            row.children = Some(
                                self.inspect_value(
                                    &child,
                                    depth - 1,
                                    max_fields,
                                    visited,
                                    circular,
                                    truncated,
                                )
                                .await?,
                            );
                        }
                    }
                }
                out.push(row);
            }
            Ok(out)
        })
    }

    pub async fn read_memory(&self, address: u64, size: usize) -> Result<MemoryRegion, EngineError> {
        {
            let state = self.state.lock();
            state.require_attached()?;
        }
        let bytes = self.binding.read_memory(address, size).await?;
        let actual = bytes.len();
        let data: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = bytes
            .iter()
            .map(|b| {
                if b.is_ascii_graphic() || *b == b' ' {
                    *b as char
                } else {
                    '.'
                }
            })
            .collect();
        Ok(MemoryRegion {
            address: format_address(address),
            requested_size: size as u64,
            actual_size: actual as u64,
            data,
            ascii,
            error: (actual < size)
                .then(|| format!("read stopped after {actual} of {size} bytes")),
        })
    }

    pub async fn type_layout(
        &self,
        type_name: &str,
        include_inherited: bool,
    ) -> Result<TypeLayout, EngineError> {
        let modules = {
            let state = self.state.lock();
            state.require_attached()?;
            state.modules.with_paths()
        };
        for (_, path) in &modules {
            if let Ok(Some(layout)) =
                self.metadata.type_layout(path, type_name, include_inherited)
            {
                return Ok(layout);
            }
        }
        Err(EngineError::InvalidArgument(format!("type '{type_name}' not found")))
    }

    pub async fn references(
        &self,
        expression: &str,
        direction: ReferenceDirection,
        max: usize,
    ) -> Result<ReferencesResult, EngineError> {
        let thread = {
            let state = self.state.lock();
            state.require_paused()?;
            state.active_thread
        };
        let segments = parse_path(expression)?;
        let value = self.resolve_value_path(thread, 0, &segments).await?;
        let address = value
            .address()
            .ok_or_else(|| EngineError::InvalidArgument("expression is not an object".into()))?;

        match direction {
            ReferenceDirection::Outbound => {
                let fields = self.binding.object_fields(&value).await?;
                let mut references = Vec::new();
                for (name, field) in &fields {
                    if let Some(target) = field.address() {
                        references.push(ObjectReference {
                            address: format_address(target),
                            type_name: field.type_name(),
                            via: Some(name.clone()),
                        });
                    }
                }
                let truncated = references.len() > max;
                references.truncate(max);
                Ok(ReferencesResult {
                    address: format_address(address),
                    direction,
                    references,
                    truncated,
                    note: None,
                })
            }
            ReferenceDirection::Inbound => {
                let (holders, truncated) = self.binding.inbound_references(address, max).await?;
                Ok(ReferencesResult {
                    address: format_address(address),
                    direction,
                    references: holders
                        .iter()
                        .map(|h| ObjectReference {
                            address: format_address(h.address().unwrap_or(0)),
                            type_name: h.type_name(),
                            via: None,
                        })
                        .collect(),
                    truncated,
                    note: truncated.then(|| "heap walk truncated".to_string()),
                })
            }
        }
    }

    // -- module browsing --

    pub fn modules_list(&self, include_system: bool) -> Result<Vec<ModuleInfo>, EngineError> {
        let state = self.state.lock();
        state.require_attached()?;
        Ok(state.modules.list(include_system))
    }

    pub fn module_types(
        &self,
        module_name: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<TypeSummary>, EngineError> {
        let path = {
            let state = self.state.lock();
            state.require_attached()?;
            state
                .modules
                .by_name(module_name)
                .and_then(|m| m.path.clone())
        };
        let path = path.ok_or_else(|| {
            EngineError::InvalidArgument(format!("module '{module_name}' not loaded"))
        })?;
        Ok(self.metadata.list_types(&path, namespace)?)
    }

    pub fn type_members(&self, type_name: &str) -> Result<Vec<TypeMember>, EngineError> {
        let modules = {
            let state = self.state.lock();
            state.require_attached()?;
            state.modules.with_paths()
        };
        for (_, path) in &modules {
            match self.metadata.list_members(path, type_name) {
                Ok(members) if !members.is_empty() => return Ok(members),
                _ => continue,
            }
        }
        Ok(Vec::new())
    }

    pub fn search_modules(
        &self,
        pattern: &str,
        search_types: bool,
        search_methods: bool,
    ) -> Result<Vec<SearchHit>, EngineError> {
        let modules = {
            let state = self.state.lock();
            state.require_attached()?;
            state
                .modules
                .list(true)
                .into_iter()
                .filter_map(|m| m.path.clone().map(|p| (m.name, p)))
                .collect::<Vec<_>>()
        };
        let needle = pattern.to_ascii_lowercase();
        let mut hits = Vec::new();
        for (module_name, path) in &modules {
            let Ok(types) = self.metadata.list_types(path, None) else {
                continue;
            };
            for ty in types {
                if search_types && ty.full_name.to_ascii_lowercase().contains(&needle) {
                    hits.push(SearchHit {
                        module: module_name.clone(),
                        name: ty.full_name.clone(),
                        kind: SearchKind::Type,
                        declaring_type: None,
                    });
                }
                if search_methods {
                    let Ok(members) = self.metadata.list_members(path, &ty.full_name) else {
                        continue;
                    };
                    for member in members {
                        if member.kind == MemberKind::Method
                            && member.name.to_ascii_lowercase().contains(&needle)
                        {
                            hits.push(SearchHit {
                                module: module_name.clone(),
                                name: member.name,
                                kind: SearchKind::Method,
                                declaring_type: Some(ty.full_name.clone()),
                            });
                        }
                    }
                }
            }
        }
        Ok(hits)
    }

    /// Current eval timeout (used by the tool surface for messaging).
    pub fn eval_timeout(&self) -> Duration {
        self.config.eval_timeout
    }
}

fn slot_to_variable(slot: &VariableSlot) -> Variable {
    let scope = match slot.kind {
        SlotKind::Local => VariableScope::Local,
        SlotKind::Argument => VariableScope::Argument,
        SlotKind::This => VariableScope::This,
    };
    let mut variable = raw_to_variable(&slot.name, &slot.value, scope);
    variable.expand_path = slot.value.has_children().then(|| slot.name.clone());
    variable
}

fn raw_to_variable(name: &str, value: &RawValue, scope: VariableScope) -> Variable {
    Variable {
        name: name.to_string(),
        type_name: value.type_name(),
        value: value.display(),
        scope,
        has_children: value.has_children(),
        child_count: match value {
            RawValue::Array { length, .. } => Some(*length),
            _ => None,
        },
        expand_path: None,
    }
}

fn parse_path(expression: &str) -> Result<Vec<String>, EngineError> {
    let expr = ildbg_expr::Parser::parse(expression)
        .map_err(|e| EngineError::syntax_error(e.to_string()))?;
    expr.as_path()
        .map(|s| s.to_vec())
        .ok_or_else(|| {
            EngineError::InvalidArgument("expected a dotted member path".to_string())
        })
}

fn format_address(address: u64) -> String {
    format!("0x{address:016X}")
}

