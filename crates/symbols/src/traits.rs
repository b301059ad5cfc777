// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seams the engine consumes: line→IL resolution and metadata
//! queries, keyed by assembly path so multi-module sessions just work.
//!
//! Production uses [`crate::resolver::SymbolStore`]; tests use the fakes
//! behind the `test-support` feature.

use crate::error::SymbolError;
use ildbg_core::{MethodToken, TypeLayout, TypeMember, TypeSummary, TypeToken};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A source span attached to a sequence point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

/// Result of resolving `(file, line, col?)` to an IL position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub method_token: MethodToken,
    pub il_offset: u32,
    pub span: SourceSpan,
}

/// A sequence point on a requested line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePoint {
    pub il_offset: u32,
    pub span: SourceSpan,
    pub hidden: bool,
}

/// Source-level symbol resolution backed by portable PDBs.
pub trait SymbolSource: Send + Sync {
    /// Map `(file, line, col?)` to the best-matching sequence point.
    ///
    /// Tie-breaks between points on the same line: prefer the span
    /// containing `col`, then the smallest start column, then the smallest
    /// IL offset. Hidden points never match.
    fn find_il_offset(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
        col: Option<u32>,
    ) -> Result<Option<ResolvedLocation>, SymbolError>;

    /// All sequence points on a line, hidden ones included.
    fn sequence_points_on_line(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
    ) -> Result<Vec<LinePoint>, SymbolError>;

    /// Nearest line within `range` that carries a non-hidden point.
    fn nearest_valid_line(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
        range: u32,
    ) -> Result<Option<u32>, SymbolError>;

    /// Reverse map: the source position of `il_offset` within a method
    /// (the closest non-hidden point at or before the offset).
    fn location_for_offset(
        &self,
        assembly: &Path,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<Option<(PathBuf, SourceSpan)>, SymbolError>;

    /// IL span of the sequence point covering `il_offset`, for steppers.
    fn step_range(
        &self,
        assembly: &Path,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<Option<(u32, u32)>, SymbolError>;

    /// Drop cached symbols for an assembly (module unload).
    fn invalidate(&self, assembly: &Path);
}

/// Metadata queries over assembly images.
pub trait MetadataSource: Send + Sync {
    /// Resolve `Ns.Type.Method` to a method token.
    fn find_method(
        &self,
        assembly: &Path,
        qualified: &str,
    ) -> Result<Option<MethodToken>, SymbolError>;

    /// Qualified name of a method token (`Ns.Type.Method`).
    fn method_name(
        &self,
        assembly: &Path,
        token: MethodToken,
    ) -> Result<Option<String>, SymbolError>;

    /// Resolve a full type name to its TypeDef token.
    fn find_type(&self, assembly: &Path, full_name: &str)
        -> Result<Option<TypeToken>, SymbolError>;

    /// One step up the extends chain, by name. `None` at `System.Object`
    /// or when the base cannot be named.
    fn base_type_name(
        &self,
        assembly: &Path,
        type_name: &str,
    ) -> Result<Option<String>, SymbolError>;

    /// Whether `candidate` is `base` or derives from it (chain walk by
    /// name, within this assembly's knowledge).
    fn is_subtype(&self, assembly: &Path, candidate: &str, base: &str)
        -> Result<bool, SymbolError>;

    /// Whether the type (not its bases) declares a field with this name.
    fn has_field(&self, assembly: &Path, type_name: &str, field: &str)
        -> Result<bool, SymbolError>;

    /// Getter token for a property on the type itself (no base traversal;
    /// the engine owns the chain walk).
    fn property_getter(
        &self,
        assembly: &Path,
        type_name: &str,
        property: &str,
    ) -> Result<Option<MethodToken>, SymbolError>;

    /// Types in the assembly, optionally filtered by namespace.
    fn list_types(
        &self,
        assembly: &Path,
        namespace: Option<&str>,
    ) -> Result<Vec<TypeSummary>, SymbolError>;

    /// Members of a type: methods, properties, fields.
    fn list_members(&self, assembly: &Path, type_name: &str)
        -> Result<Vec<TypeMember>, SymbolError>;

    /// Field offsets and padding computed from metadata.
    fn type_layout(
        &self,
        assembly: &Path,
        type_name: &str,
        include_inherited: bool,
    ) -> Result<Option<TypeLayout>, SymbolError>;

    /// Drop cached metadata for an assembly (module unload).
    fn invalidate(&self, assembly: &Path);
}
