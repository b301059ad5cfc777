// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The production [`SymbolSource`] / [`MetadataSource`] implementation:
//! caches parsed assemblies and their portable PDBs per
//! `(path, mtime, size)` and answers the engine's queries from them.

use crate::error::SymbolError;
use crate::image::{Image, TypeBase};
use crate::pdb::{PortablePdb, SequencePoint};
use crate::sig::TypeSig;
use crate::traits::{LinePoint, MetadataSource, ResolvedLocation, SourceSpan, SymbolSource};
use ildbg_core::{
    FieldLayout, MemberKind, MethodToken, PaddingRegion, TypeLayout, TypeMember, TypeSummary,
    TypeToken,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

const FD_STATIC: u32 = 0x10;
const OBJECT_HEADER_SIZE: u64 = 16;
const VALUE_TYPE_RECURSION_LIMIT: u32 = 8;

/// File identity used to validate cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    mtime: Option<SystemTime>,
    size: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, SymbolError> {
        let meta = std::fs::metadata(path)
            .map_err(|source| SymbolError::Io { path: path.to_path_buf(), source })?;
        Ok(Self { mtime: meta.modified().ok(), size: meta.len() })
    }
}

struct PdbEntry {
    stamp: FileStamp,
    pdb: Arc<PortablePdb>,
}

struct ImageEntry {
    stamp: FileStamp,
    image: Arc<Image>,
}

/// Read-mostly symbol and metadata cache shared by the engine and the
/// module-browsing tools.
#[derive(Default)]
pub struct SymbolStore {
    pdbs: RwLock<HashMap<PathBuf, PdbEntry>>,
    images: RwLock<HashMap<PathBuf, ImageEntry>>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `.pdb` expected beside an assembly.
    fn pdb_path(assembly: &Path) -> PathBuf {
        assembly.with_extension("pdb")
    }

    fn pdb_for(&self, assembly: &Path) -> Result<Arc<PortablePdb>, SymbolError> {
        let path = Self::pdb_path(assembly);
        if !path.exists() {
            return Err(SymbolError::NoSymbols { path: assembly.to_path_buf() });
        }
        let stamp = FileStamp::of(&path)?;
        if let Some(entry) = self.pdbs.read().get(assembly) {
            if entry.stamp == stamp {
                return Ok(Arc::clone(&entry.pdb));
            }
        }
        debug!(assembly = %assembly.display(), pdb = %path.display(), "loading portable pdb");
        let pdb = Arc::new(PortablePdb::open(&path)?);
        self.pdbs
            .write()
            .insert(assembly.to_path_buf(), PdbEntry { stamp, pdb: Arc::clone(&pdb) });
        Ok(pdb)
    }

    fn image_for(&self, assembly: &Path) -> Result<Arc<Image>, SymbolError> {
        let stamp = FileStamp::of(assembly)?;
        if let Some(entry) = self.images.read().get(assembly) {
            if entry.stamp == stamp {
                return Ok(Arc::clone(&entry.image));
            }
        }
        debug!(assembly = %assembly.display(), "loading assembly metadata");
        let image = Arc::new(Image::open(assembly)?);
        self.images
            .write()
            .insert(assembly.to_path_buf(), ImageEntry { stamp, image: Arc::clone(&image) });
        Ok(image)
    }

    /// Candidate sequence points on `line`, already filtered to the
    /// document and with hidden points dropped.
    fn candidates_on_line(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
    ) -> Result<Vec<(MethodToken, SequencePoint)>, SymbolError> {
        let pdb = self.pdb_for(assembly)?;
        let Some(document) = pdb.find_document(file) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for method in pdb.methods_in_document(document) {
            for point in pdb.sequence_points(method)? {
                if point.document == document && !point.is_hidden && point.start_line == line {
                    out.push((method, point));
                }
            }
        }
        Ok(out)
    }

    fn layout_of(
        &self,
        image: &Image,
        token: TypeToken,
        include_inherited: bool,
    ) -> Result<TypeLayout, SymbolError> {
        let type_name = image.type_name(token).map_err(SymbolError::Malformed)?;
        let base_type = match image.extends(token).map_err(SymbolError::Malformed)? {
            Some(TypeBase::InModule(base)) => {
                Some(image.type_name(base).map_err(SymbolError::Malformed)?)
            }
            Some(TypeBase::Named(name)) => Some(name),
            None => None,
        };
        let is_value_type =
            matches!(base_type.as_deref(), Some("System.ValueType") | Some("System.Enum"));

        // Collect declaring types base-first so inherited fields lead.
        let mut chain = vec![token];
        if include_inherited {
            chain = image.base_chain(token);
            chain.reverse();
        }

        let header_size = if is_value_type { 0 } else { OBJECT_HEADER_SIZE };
        let mut offset = header_size;
        let mut fields = Vec::new();
        let mut padding = Vec::new();
        for declaring in &chain {
            let declared_by = if chain.len() > 1 && *declaring != token {
                Some(image.type_name(*declaring).map_err(SymbolError::Malformed)?)
            } else {
                None
            };
            for field in image.fields_of(*declaring).map_err(SymbolError::Malformed)? {
                if field.flags & FD_STATIC != 0 {
                    continue;
                }
                let size = field
                    .sig
                    .as_ref()
                    .map(|sig| self.sig_size(image, sig, 0))
                    .unwrap_or(8);
                let align = size.clamp(1, 8);
                let aligned = offset.div_ceil(align) * align;
                if aligned > offset {
                    padding.push(PaddingRegion { offset, size: aligned - offset });
                }
                offset = aligned;
                let type_name = field
                    .sig
                    .as_ref()
                    .map(|sig| image.sig_name(sig))
                    .unwrap_or_else(|| "?".to_string());
                fields.push(FieldLayout {
                    name: field.name,
                    type_name,
                    offset,
                    size,
                    declared_by: declared_by.clone(),
                });
                offset += size;
            }
        }

        let total_size = if is_value_type {
            offset.max(1)
        } else {
            offset.max(header_size).div_ceil(8) * 8
        };
        Ok(TypeLayout {
            type_name,
            total_size,
            header_size,
            data_size: total_size - header_size,
            fields,
            padding,
            is_value_type,
            base_type,
        })
    }

    /// Size of a field within a layout; in-module value types recurse.
    fn sig_size(&self, image: &Image, sig: &TypeSig, depth: u32) -> u64 {
        if let Some(size) = sig.fixed_size() {
            return size;
        }
        if depth >= VALUE_TYPE_RECURSION_LIMIT {
            return 8;
        }
        if let TypeSig::ValueType(r) = sig {
            if r.table == crate::tables::TYPE_DEF {
                let token = TypeToken::from_row(r.row);
                if let Ok(fields) = image.fields_of(token) {
                    let mut total = 0u64;
                    for field in fields {
                        if field.flags & FD_STATIC != 0 {
                            continue;
                        }
                        total += field
                            .sig
                            .as_ref()
                            .map(|s| self.sig_size(image, s, depth + 1))
                            .unwrap_or(8);
                    }
                    return total.max(1);
                }
            }
        }
        8
    }
}

impl SymbolSource for SymbolStore {
    fn find_il_offset(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
        col: Option<u32>,
    ) -> Result<Option<ResolvedLocation>, SymbolError> {
        let mut candidates = self.candidates_on_line(assembly, file, line)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        // Prefer the span containing the requested column, then the
        // smallest start column, then the smallest IL offset.
        candidates.sort_by_key(|(_, p)| {
            let contains = col.is_some_and(|c| p.span_contains(line, c));
            (!contains, p.start_col, p.il_offset)
        });
        let (method_token, point) = candidates[0];
        Ok(Some(ResolvedLocation {
            method_token,
            il_offset: point.il_offset,
            span: span_of(&point),
        }))
    }

    fn sequence_points_on_line(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
    ) -> Result<Vec<LinePoint>, SymbolError> {
        let pdb = self.pdb_for(assembly)?;
        let Some(document) = pdb.find_document(file) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for method in pdb.methods_in_document(document) {
            for point in pdb.sequence_points(method)? {
                if point.document != document {
                    continue;
                }
                if point.is_hidden || point.start_line != line {
                    continue;
                }
                out.push(LinePoint {
                    il_offset: point.il_offset,
                    span: span_of(&point),
                    hidden: point.is_hidden,
                });
            }
        }
        out.sort_by_key(|p| (p.span.start_col, p.il_offset));
        Ok(out)
    }

    fn nearest_valid_line(
        &self,
        assembly: &Path,
        file: &Path,
        line: u32,
        range: u32,
    ) -> Result<Option<u32>, SymbolError> {
        let pdb = self.pdb_for(assembly)?;
        let Some(document) = pdb.find_document(file) else {
            return Ok(None);
        };
        let mut best: Option<u32> = None;
        for method in pdb.methods_in_document(document) {
            for point in pdb.sequence_points(method)? {
                if point.document != document || point.is_hidden {
                    continue;
                }
                let candidate = point.start_line;
                if candidate.abs_diff(line) > range {
                    continue;
                }
                best = match best {
                    // Ties go to the earlier line.
                    Some(current)
                        if (current.abs_diff(line), current)
                            <= (candidate.abs_diff(line), candidate) =>
                    {
                        Some(current)
                    }
                    _ => Some(candidate),
                };
            }
        }
        Ok(best)
    }

    fn location_for_offset(
        &self,
        assembly: &Path,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<Option<(PathBuf, SourceSpan)>, SymbolError> {
        let pdb = self.pdb_for(assembly)?;
        let points = pdb.sequence_points(method)?;
        let best = points
            .iter()
            .filter(|p| !p.is_hidden && p.il_offset <= il_offset)
            .max_by_key(|p| p.il_offset);
        match best {
            Some(point) => {
                let file = pdb.document_name(point.document).map_err(SymbolError::Malformed)?;
                Ok(Some((PathBuf::from(file), span_of(point))))
            }
            None => Ok(None),
        }
    }

    fn step_range(
        &self,
        assembly: &Path,
        method: MethodToken,
        il_offset: u32,
    ) -> Result<Option<(u32, u32)>, SymbolError> {
        let pdb = self.pdb_for(assembly)?;
        let points = pdb.sequence_points(method)?;
        let mut sorted: Vec<&SequencePoint> = points.iter().collect();
        sorted.sort_by_key(|p| p.il_offset);
        for pair in sorted.windows(2) {
            if pair[0].il_offset <= il_offset && il_offset < pair[1].il_offset {
                return Ok(Some((pair[0].il_offset, pair[1].il_offset)));
            }
        }
        match sorted.last() {
            Some(last) if last.il_offset <= il_offset => Ok(Some((last.il_offset, u32::MAX))),
            _ => Ok(None),
        }
    }

    fn invalidate(&self, assembly: &Path) {
        self.pdbs.write().remove(assembly);
    }
}

impl MetadataSource for SymbolStore {
    fn find_method(
        &self,
        assembly: &Path,
        qualified: &str,
    ) -> Result<Option<MethodToken>, SymbolError> {
        Ok(self.image_for(assembly)?.find_method(qualified))
    }

    fn method_name(
        &self,
        assembly: &Path,
        token: MethodToken,
    ) -> Result<Option<String>, SymbolError> {
        let image = self.image_for(assembly)?;
        let Ok(entry) = image.method_entry(token) else {
            return Ok(None);
        };
        match image.method_declaring_type(token) {
            Some(declaring) => {
                let type_name = image.type_name(declaring).map_err(SymbolError::Malformed)?;
                Ok(Some(format!("{type_name}.{}", entry.name)))
            }
            None => Ok(Some(entry.name)),
        }
    }

    fn find_type(
        &self,
        assembly: &Path,
        full_name: &str,
    ) -> Result<Option<TypeToken>, SymbolError> {
        Ok(self.image_for(assembly)?.find_type(full_name))
    }

    fn base_type_name(
        &self,
        assembly: &Path,
        type_name: &str,
    ) -> Result<Option<String>, SymbolError> {
        let image = self.image_for(assembly)?;
        let Some(token) = image.find_type(type_name) else {
            return Ok(None);
        };
        match image.extends(token).map_err(SymbolError::Malformed)? {
            Some(TypeBase::InModule(base)) => {
                Ok(Some(image.type_name(base).map_err(SymbolError::Malformed)?))
            }
            Some(TypeBase::Named(name)) => Ok(Some(name)),
            None => Ok(None),
        }
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
        assembly: &Path,
        type_name: &str,
        field: &str,
    ) -> Result<bool, SymbolError> {
        let image = self.image_for(assembly)?;
        let Some(token) = image.find_type(type_name) else {
            return Ok(false);
        };
        Ok(image.field_by_name(token, field).is_some())
    }

    fn property_getter(
        &self,
        assembly: &Path,
        type_name: &str,
        property: &str,
    ) -> Result<Option<MethodToken>, SymbolError> {
        let image = self.image_for(assembly)?;
        let Some(token) = image.find_type(type_name) else {
            return Ok(None);
        };
        Ok(image.property_getter(token, property))
    }

    fn list_types(
        &self,
        assembly: &Path,
        namespace: Option<&str>,
    ) -> Result<Vec<TypeSummary>, SymbolError> {
        let image = self.image_for(assembly)?;
        let entries = image.types(namespace).map_err(SymbolError::Malformed)?;
        Ok(entries
            .into_iter()
            .filter(|t| t.full_name != "<Module>")
            .map(|t| TypeSummary {
                full_name: t.full_name,
                token: t.token.raw(),
                is_interface: t.is_interface,
                is_abstract: t.is_abstract,
                is_public: t.is_public,
            })
            .collect())
    }

    fn list_members(
        &self,
        assembly: &Path,
        type_name: &str,
    ) -> Result<Vec<TypeMember>, SymbolError> {
        let image = self.image_for(assembly)?;
        let Some(token) = image.find_type(type_name) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        let properties = image.properties_of(token).map_err(SymbolError::Malformed)?;
        let accessor_tokens: Vec<MethodToken> = properties
            .iter()
            .flat_map(|p| [p.getter, p.setter])
            .flatten()
            .collect();
        for method in image.methods_of(token).map_err(SymbolError::Malformed)? {
            if accessor_tokens.contains(&method.token) || method.name == ".ctor" {
                continue;
            }
            let signature = method.sig.as_ref().map(|sig| render_method_sig(&image, sig));
            out.push(TypeMember {
                name: method.name,
                kind: MemberKind::Method,
                signature,
                is_static: method.flags & 0x10 != 0,
            });
        }
        for property in properties {
            let signature = property
                .getter
                .and_then(|token| image.method_entry(token).ok())
                .and_then(|m| m.sig)
                .map(|sig| image.sig_name(&sig.return_type));
            out.push(TypeMember {
                name: property.name,
                kind: MemberKind::Property,
                signature,
                is_static: false,
            });
        }
        for field in image.fields_of(token).map_err(SymbolError::Malformed)? {
            let signature = field.sig.as_ref().map(|sig| image.sig_name(sig));
            out.push(TypeMember {
                name: field.name,
                kind: MemberKind::Field,
                signature,
                is_static: field.flags & FD_STATIC != 0,
            });
        }
        Ok(out)
    }

    fn type_layout(
        &self,
        assembly: &Path,
        type_name: &str,
        include_inherited: bool,
    ) -> Result<Option<TypeLayout>, SymbolError> {
        let image = self.image_for(assembly)?;
        let Some(token) = image.find_type(type_name) else {
            return Ok(None);
        };
        self.layout_of(&image, token, include_inherited).map(Some)
    }

    fn invalidate(&self, assembly: &Path) {
        self.images.write().remove(assembly);
        self.pdbs.write().remove(assembly);
    }
}

fn span_of(point: &SequencePoint) -> SourceSpan {
    SourceSpan {
        start_line: point.start_line,
        start_col: point.start_col,
        end_line: point.end_line,
        end_col: point.end_col,
    }
}

fn render_method_sig(image: &Image, sig: &crate::sig::MethodSig) -> String {
    let params: Vec<String> = sig.params.iter().map(|p| image.sig_name(p)).collect();
    format!("{} ({})", image.sig_name(&sig.return_type), params.join(", "))
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
