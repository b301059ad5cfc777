// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Programmable fakes for the symbol and metadata seams.
//!
//! Used by engine and server tests so breakpoint binding and member
//! resolution can be exercised without real assemblies on disk.

use crate::error::SymbolError;
use crate::traits::{LinePoint, MetadataSource, ResolvedLocation, SourceSpan, SymbolSource};
use ildbg_core::{MethodToken, TypeLayout, TypeMember, TypeSummary, TypeToken};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

fn file_key(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

#[derive(Default)]
struct Inner {
    /// `(file basename, line)` → resolution.
    lines: HashMap<(String, u32), ResolvedLocation>,
    /// Method token → non-hidden points `(il_offset, file, line)`.
    points: HashMap<u32, Vec<(u32, PathBuf, u32)>>,
    /// Qualified method name → token.
    methods: HashMap<String, MethodToken>,
    /// Token → qualified name.
    method_names: HashMap<u32, String>,
    /// Type name → token.
    types: HashMap<String, TypeToken>,
    /// Type → base type name.
    bases: HashMap<String, String>,
    /// `(type, property)` → getter token.
    getters: HashMap<(String, String), MethodToken>,
    /// `(type, field)` declared fields.
    fields: HashSet<(String, String)>,
    /// Canned layouts by type name.
    layouts: HashMap<String, TypeLayout>,
    /// Canned member lists by type name.
    members: HashMap<String, Vec<TypeMember>>,
    invalidated: Vec<PathBuf>,
}

/// A fake [`SymbolSource`] + [`MetadataSource`] fed by tests.
#[derive(Default)]
pub struct FakeSymbols {
    inner: RwLock<Inner>,
}

impl FakeSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breakpointable line.
    pub fn add_line(&self, file: &str, line: u32, method: MethodToken, il_offset: u32) {
        let mut inner = self.inner.write();
        let span = SourceSpan { start_line: line, start_col: 9, end_line: line, end_col: 40 };
        inner.lines.insert(
            (file.to_ascii_lowercase(), line),
            ResolvedLocation { method_token: method, il_offset, span },
        );
        let points = inner.points.entry(method.raw()).or_default();
        points.push((il_offset, PathBuf::from(file), line));
        points.sort();
    }

    /// Register a method for function breakpoints and name rendering.
    pub fn add_method(&self, qualified: &str, token: MethodToken) {
        let mut inner = self.inner.write();
        inner.methods.insert(qualified.to_string(), token);
        inner.method_names.insert(token.raw(), qualified.to_string());
    }

    pub fn add_type(&self, name: &str, token: TypeToken) {
        self.inner.write().types.insert(name.to_string(), token);
    }

    /// Register `ty : base`.
    pub fn set_base(&self, ty: &str, base: &str) {
        self.inner.write().bases.insert(ty.to_string(), base.to_string());
    }

    pub fn add_getter(&self, ty: &str, property: &str, token: MethodToken) {
        self.inner
            .write()
            .getters
            .insert((ty.to_string(), property.to_string()), token);
    }

    pub fn add_field(&self, ty: &str, field: &str) {
        self.inner.write().fields.insert((ty.to_string(), field.to_string()));
    }

    pub fn set_layout(&self, layout: TypeLayout) {
        self.inner.write().layouts.insert(layout.type_name.clone(), layout);
    }

    pub fn set_members(&self, ty: &str, members: Vec<TypeMember>) {
        self.inner.write().members.insert(ty.to_string(), members);
    }

    /// Assemblies whose caches were dropped via `invalidate`.
    pub fn invalidated(&self) -> Vec<PathBuf> {
        self.inner.read().invalidated.clone()
    }
}

impl SymbolSource for FakeSymbols {
    fn find_il_offset(
        &self,
        _assembly: &Path,
        file: &Path,
        line: u32,
        _col: Option<u32>,
    ) -> Result<Option<ResolvedLocation>, SymbolError> {
        Ok(self.inner.read().lines.get(&(file_key(file), line)).cloned())
    }

    fn sequence_points_on_line(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
    ) -> Result<Vec<LinePoint>, SymbolError> {
        Ok(self
            .find_il_offset(assembly, file, line, None)?
            .map(|loc| LinePoint { il_offset: loc.il_offset, span: loc.span, hidden: false })
            .into_iter()
            .collect())
    }

    fn nearest_valid_line(
        &self,
        _assembly: &Path,
        file: &Path,
        line: u32,
        range: u32,
    ) -> Result<Option<u32>, SymbolError> {
        let key = file_key(file);
        let inner = self.inner.read();
        let mut best: Option<u32> = None;
        for (entry_file, entry_line) in inner.lines.keys() {
            if *entry_file != key || entry_line.abs_diff(line) > range {
                continue;
            }
            best = match best {
                Some(current)
                    if (current.abs_diff(line), current)
                        <= (entry_line.abs_diff(line), *entry_line) =>
                {
                    Some(current)
                }
                _ => Some(*entry_line),
            };
        }
        Ok(best)
    }

    fn location_for_offset(
        &self,
        _assembly: &Path,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<Option<(PathBuf, SourceSpan)>, SymbolError> {
        let inner = self.inner.read();
        let Some(points) = inner.points.get(&method.raw()) else {
            return Ok(None);
        };
        let best = points.iter().filter(|(offset, _, _)| *offset <= il_offset).next_back();
        Ok(best.map(|(_, file, line)| {
            (
                file.clone(),
                SourceSpan { start_line: *line, start_col: 9, end_line: *line, end_col: 40 },
            )
        }))
    }

    fn step_range(
        &self,
        _assembly: &Path,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<Option<(u32, u32)>, SymbolError> {
        let inner = self.inner.read();
        let Some(points) = inner.points.get(&method.raw()) else {
            return Ok(None);
        };
        let mut start = None;
        let mut end = u32::MAX;
        for (offset, _, _) in points {
            if *offset <= il_offset {
                start = Some(*offset);
            } else {
                end = *offset;
                break;
            }
        }
        Ok(start.map(|s| (s, end)))
    }

    fn invalidate(&self, assembly: &Path) {
        self.inner.write().invalidated.push(assembly.to_path_buf());
    }
}

impl MetadataSource for FakeSymbols {
    fn find_method(
        &self,
        _assembly: &Path,
        qualified: &str,
    ) -> Result<Option<MethodToken>, SymbolError> {
        Ok(self.inner.read().methods.get(qualified).copied())
    }

    fn method_name(
        &self,
        _assembly: &Path,
        token: MethodToken,
    ) -> Result<Option<String>, SymbolError> {
        Ok(self.inner.read().method_names.get(&token.raw()).cloned())
    }

    fn find_type(
        &self,
        _assembly: &Path,
        full_name: &str,
    ) -> Result<Option<TypeToken>, SymbolError> {
        Ok(self.inner.read().types.get(full_name).copied())
    }

    fn base_type_name(
        &self,
        _assembly: &Path,
        type_name: &str,
    ) -> Result<Option<String>, SymbolError> {
        Ok(self.inner.read().bases.get(type_name).cloned())
    }

    fn is_subtype(
        &self,
        assembly: &Path,
        candidate: &str,
        base: &str,
    ) -> Result<bool, SymbolError> {
        let mut current = candidate.to_string();
        for _ in 0..64 {
            if current == base {
                return Ok(true);
            }
            match self.base_type_name(assembly, &current)? {
                Some(next) => current = next,
                None => return Ok(false),
            }
        }
        Ok(false)
    }

    fn has_field(
        &self,
        _assembly: &Path,
        type_name: &str,
        field: &str,
    ) -> Result<bool, SymbolError> {
        Ok(self
            .inner
            .read()
            .fields
            .contains(&(type_name.to_string(), field.to_string())))
    }

    fn property_getter(
        &self,
        _assembly: &Path,
        type_name: &str,
        property: &str,
    ) -> Result<Option<MethodToken>, SymbolError> {
        Ok(self
            .inner
            .read()
            .getters
            .get(&(type_name.to_string(), property.to_string()))
            .copied())
    }

    fn list_types(
        &self,
        _assembly: &Path,
        namespace: Option<&str>,
    ) -> Result<Vec<TypeSummary>, SymbolError> {
        let inner = self.inner.read();
        let mut out: Vec<TypeSummary> = inner
            .types
            .iter()
            .filter(|(name, _)| {
                namespace.is_none_or(|ns| {
                    name.rsplit_once('.').map(|(head, _)| head) == Some(ns)
                })
            })
            .map(|(name, token)| TypeSummary {
                full_name: name.clone(),
                token: token.raw(),
                is_interface: false,
                is_abstract: false,
                is_public: true,
            })
            .collect();
        out.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(out)
    }

    fn list_members(
        &self,
        _assembly: &Path,
        type_name: &str,
    ) -> Result<Vec<TypeMember>, SymbolError> {
        Ok(self.inner.read().members.get(type_name).cloned().unwrap_or_default())
    }

    fn type_layout(
        &self,
        _assembly: &Path,
        type_name: &str,
        _include_inherited: bool,
    ) -> Result<Option<TypeLayout>, SymbolError> {
        Ok(self.inner.read().layouts.get(type_name).cloned())
    }

    fn invalidate(&self, assembly: &Path) {
        self.inner.write().invalidated.push(assembly.to_path_buf());
    }
}
