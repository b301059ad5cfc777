// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata reader over a managed assembly image.
//!
//! Row access is lazy; nothing is materialised up front except the stream
//! directory. Tokens returned from here are the same tokens the engine
//! hands to the native binding.

use crate::error::{FormatError, SymbolError};
use crate::pe;
use crate::sig::{self, MethodSig, SigTypeRef, TypeSig};
use crate::streams::{self, MetadataRoot};
use crate::tables::{self, CodedKind, TableDirectory, TABLE_COUNT};
use ildbg_core::{FieldToken, MethodToken, TypeToken};
use std::path::{Path, PathBuf};

// TypeDef flag masks.
const TD_VISIBILITY_MASK: u32 = 0x0000_0007;
const TD_INTERFACE: u32 = 0x0000_0020;
const TD_ABSTRACT: u32 = 0x0000_0080;

// MethodDef flag masks.
const MD_STATIC: u32 = 0x0010;

// MethodSemantics flags.
const SEM_SETTER: u32 = 0x0001;
const SEM_GETTER: u32 = 0x0002;

/// A parsed assembly (or any managed PE image).
pub struct Image {
    path: PathBuf,
    data: Vec<u8>,
    root: MetadataRoot,
    tables: TableDirectory,
}

/// Where a base type lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBase {
    /// TypeDef in the same image.
    InModule(TypeToken),
    /// TypeRef into another assembly, resolved by name.
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodEntry {
    pub token: MethodToken,
    pub name: String,
    pub flags: u32,
    pub sig: Option<MethodSig>,
}

impl MethodEntry {
    pub fn is_static(&self) -> bool {
        self.flags & MD_STATIC != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub token: FieldToken,
    pub name: String,
    pub flags: u32,
    pub sig: Option<TypeSig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub name: String,
    pub getter: Option<MethodToken>,
    pub setter: Option<MethodToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub token: TypeToken,
    pub full_name: String,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub is_public: bool,
}

impl Image {
    /// Read and parse an assembly from disk.
    pub fn open(path: &Path) -> Result<Self, SymbolError> {
        let data = std::fs::read(path)
            .map_err(|source| SymbolError::Io { path: path.to_path_buf(), source })?;
        Self::from_bytes(data, path).map_err(|e| match e {
            FormatError::Unsupported(_) | FormatError::BadMagic { .. } => {
                SymbolError::NotManaged { path: path.to_path_buf() }
            }
            other => SymbolError::Malformed(other),
        })
    }

    /// Parse an image already in memory.
    pub fn from_bytes(data: Vec<u8>, path: &Path) -> Result<Self, FormatError> {
        let location = pe::locate_metadata(&data)?;
        let root = MetadataRoot::parse(&data, location.offset)?;
        let tables_range = root.tables.ok_or(FormatError::MissingStream("#~"))?;

        let external = match root.pdb {
            Some(range) => streams::PdbStream::parse(&data, range)?.type_system_rows,
            None => [0u32; TABLE_COUNT],
        };
        let tables = TableDirectory::parse(&data, tables_range.offset, &external)?;
        Ok(Self { path: path.to_path_buf(), data, root, tables })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tables(&self) -> &TableDirectory {
        &self.tables
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn root(&self) -> &MetadataRoot {
        &self.root
    }

    // -- heap access --

    pub(crate) fn string(&self, index: u32) -> Result<&str, FormatError> {
        let heap = self
            .root
            .strings
            .ok_or(FormatError::MissingStream("#Strings"))?
            .slice(&self.data)?;
        streams::string_at(heap, index)
    }

    pub(crate) fn blob(&self, index: u32) -> Result<&[u8], FormatError> {
        let heap = self
            .root
            .blob
            .ok_or(FormatError::MissingStream("#Blob"))?
            .slice(&self.data)?;
        streams::blob_at(heap, index)
    }

    fn row(&self, table: u8, row: u32) -> Result<Vec<u32>, FormatError> {
        self.tables.read_row(&self.data, table, row)
    }

    // -- assembly / module --

    /// Simple assembly name from the Assembly table.
    pub fn assembly_name(&self) -> Option<String> {
        let row = self.row(tables::ASSEMBLY, 1).ok()?;
        self.string(row[7]).ok().map(str::to_string)
    }

    /// Module name from the Module table.
    pub fn module_name(&self) -> Option<String> {
        let row = self.row(tables::MODULE, 1).ok()?;
        self.string(row[1]).ok().map(str::to_string)
    }

    // -- types --

    pub fn type_count(&self) -> u32 {
        self.tables.row_count(tables::TYPE_DEF)
    }

    /// Full name of a TypeDef; nested types render as `Ns.Outer+Inner`.
    pub fn type_name(&self, token: TypeToken) -> Result<String, FormatError> {
        let row = self.row(tables::TYPE_DEF, token.row())?;
        let name = self.string(row[1])?;
        let namespace = self.string(row[2])?;
        if let Some(outer) = self.enclosing_type(token) {
            return Ok(format!("{}+{}", self.type_name(outer)?, name));
        }
        if namespace.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{namespace}.{name}"))
        }
    }

    pub fn type_flags(&self, token: TypeToken) -> Result<u32, FormatError> {
        Ok(self.row(tables::TYPE_DEF, token.row())?[0])
    }

    /// All TypeDefs, optionally filtered by namespace.
    pub fn types(&self, namespace: Option<&str>) -> Result<Vec<TypeEntry>, FormatError> {
        let mut out = Vec::new();
        for row_index in 1..=self.type_count() {
            let token = TypeToken::from_row(row_index);
            let row = self.row(tables::TYPE_DEF, row_index)?;
            if let Some(ns) = namespace {
                if self.string(row[2])? != ns {
                    continue;
                }
            }
            let flags = row[0];
            out.push(TypeEntry {
                token,
                full_name: self.type_name(token)?,
                is_interface: flags & TD_INTERFACE != 0,
                is_abstract: flags & TD_ABSTRACT != 0,
                is_public: flags & TD_VISIBILITY_MASK == 1,
            });
        }
        Ok(out)
    }

    /// Find a TypeDef by full name (`Ns.Type` or `Ns.Outer+Inner`).
    pub fn find_type(&self, full_name: &str) -> Option<TypeToken> {
        for row_index in 1..=self.type_count() {
            let token = TypeToken::from_row(row_index);
            if self.type_name(token).ok().as_deref() == Some(full_name) {
                return Some(token);
            }
        }
        None
    }

    /// Base type of a TypeDef. `None` for `System.Object`, interfaces and
    /// `<Module>`.
    pub fn extends(&self, token: TypeToken) -> Result<Option<TypeBase>, FormatError> {
        let row = self.row(tables::TYPE_DEF, token.row())?;
        let coded = row[3];
        let Some((table, target_row)) = CodedKind::TypeDefOrRef.decode(coded) else {
            return Ok(None);
        };
        if target_row == 0 {
            return Ok(None);
        }
        match table {
            tables::TYPE_DEF => Ok(Some(TypeBase::InModule(TypeToken::from_row(target_row)))),
            tables::TYPE_REF => {
                let type_ref = self.row(tables::TYPE_REF, target_row)?;
                let name = self.string(type_ref[1])?;
                let namespace = self.string(type_ref[2])?;
                let full = if namespace.is_empty() {
                    name.to_string()
                } else {
                    format!("{namespace}.{name}")
                };
                Ok(Some(TypeBase::Named(full)))
            }
            // A TypeSpec base (generic instantiation); name the definition.
            _ => Ok(None),
        }
    }

    /// Walk the extends chain inside this image, yielding `token` first.
    /// Stops at `System.Object` or when the base leaves the image.
    pub fn base_chain(&self, token: TypeToken) -> Vec<TypeToken> {
        let mut chain = vec![token];
        let mut current = token;
        while let Ok(Some(TypeBase::InModule(base))) = self.extends(current) {
            if chain.contains(&base) {
                break; // corrupt metadata cycle
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    // -- members --

    /// Contiguous member range for a TypeDef list column (`field_list` /
    /// `method_list`): the row range ends where the next TypeDef's begins.
    fn member_range(
        &self,
        type_row: u32,
        list_col: usize,
        member_table: u8,
    ) -> Result<std::ops::Range<u32>, FormatError> {
        let start = self.row(tables::TYPE_DEF, type_row)?[list_col];
        let end = if type_row < self.type_count() {
            self.row(tables::TYPE_DEF, type_row + 1)?[list_col]
        } else {
            self.tables.row_count(member_table) + 1
        };
        Ok(start..end)
    }

    pub fn methods_of(&self, token: TypeToken) -> Result<Vec<MethodEntry>, FormatError> {
        let range = self.member_range(token.row(), 5, tables::METHOD_DEF)?;
        range.map(|row| self.method_entry(MethodToken::from_row(row))).collect()
    }

    pub fn method_entry(&self, token: MethodToken) -> Result<MethodEntry, FormatError> {
        let row = self.row(tables::METHOD_DEF, token.row())?;
        let name = self.string(row[3])?.to_string();
        let sig = self.blob(row[4]).ok().and_then(|blob| sig::method_sig(blob).ok());
        Ok(MethodEntry { token, name, flags: row[2], sig })
    }

    /// Declaring type of a method, by scanning the method-list ranges.
    pub fn method_declaring_type(&self, token: MethodToken) -> Option<TypeToken> {
        let method_row = token.row();
        for type_row in 1..=self.type_count() {
            let range = self.member_range(type_row, 5, tables::METHOD_DEF).ok()?;
            if range.contains(&method_row) {
                return Some(TypeToken::from_row(type_row));
            }
        }
        None
    }

    /// Resolve `Ns.Type.Method` (or `Ns.Outer+Inner.Method`) to a token.
    pub fn find_method(&self, qualified: &str) -> Option<MethodToken> {
        let (type_name, method_name) = qualified.rsplit_once('.')?;
        let type_token = self.find_type(type_name)?;
        self.methods_of(type_token)
            .ok()?
            .into_iter()
            .find(|m| m.name == method_name)
            .map(|m| m.token)
    }

    pub fn fields_of(&self, token: TypeToken) -> Result<Vec<FieldEntry>, FormatError> {
        let range = self.member_range(token.row(), 4, tables::FIELD)?;
        range
            .map(|row_index| {
                let row = self.row(tables::FIELD, row_index)?;
                let name = self.string(row[1])?.to_string();
                let sig = self.blob(row[2]).ok().and_then(|blob| sig::field_type(blob).ok());
                Ok(FieldEntry { token: FieldToken::from_row(row_index), name, flags: row[0], sig })
            })
            .collect()
    }

    /// Field lookup on the declared type only (no base traversal).
    pub fn field_by_name(&self, token: TypeToken, name: &str) -> Option<FieldEntry> {
        self.fields_of(token).ok()?.into_iter().find(|f| f.name == name)
    }

    /// Properties of a type with accessors resolved through
    /// MethodSemantics, falling back to the `get_X`/`set_X` convention.
    pub fn properties_of(&self, token: TypeToken) -> Result<Vec<PropertyEntry>, FormatError> {
        let mut out = Vec::new();
        let map_rows = self.tables.row_count(tables::PROPERTY_MAP);
        for map_row in 1..=map_rows {
            let map = self.row(tables::PROPERTY_MAP, map_row)?;
            if map[0] != token.row() {
                continue;
            }
            let start = map[1];
            let end = if map_row < map_rows {
                self.row(tables::PROPERTY_MAP, map_row + 1)?[1]
            } else {
                self.tables.row_count(tables::PROPERTY) + 1
            };
            for prop_row in start..end {
                let prop = self.row(tables::PROPERTY, prop_row)?;
                let name = self.string(prop[1])?.to_string();
                let (getter, setter) = self.accessors_for(token, prop_row, &name)?;
                out.push(PropertyEntry { name, getter, setter });
            }
        }
        Ok(out)
    }

    /// Getter for a named property, traversing only this type.
    pub fn property_getter(&self, token: TypeToken, name: &str) -> Option<MethodToken> {
        if let Ok(props) = self.properties_of(token) {
            if let Some(p) = props.into_iter().find(|p| p.name == name) {
                if p.getter.is_some() {
                    return p.getter;
                }
            }
        }
        // Semi-mangled accessor name fallback.
        let getter_name = format!("get_{name}");
        self.methods_of(token)
            .ok()?
            .into_iter()
            .find(|m| m.name == getter_name)
            .map(|m| m.token)
    }

    fn accessors_for(
        &self,
        type_token: TypeToken,
        property_row: u32,
        name: &str,
    ) -> Result<(Option<MethodToken>, Option<MethodToken>), FormatError> {
        let mut getter = None;
        let mut setter = None;
        let sem_rows = self.tables.row_count(tables::METHOD_SEMANTICS);
        for sem_row in 1..=sem_rows {
            let sem = self.row(tables::METHOD_SEMANTICS, sem_row)?;
            let Some((table, row)) = CodedKind::HasSemantics.decode(sem[2]) else {
                continue;
            };
            if table != tables::PROPERTY || row != property_row {
                continue;
            }
            if sem[0] & SEM_GETTER != 0 {
                getter = Some(MethodToken::from_row(sem[1]));
            }
            if sem[0] & SEM_SETTER != 0 {
                setter = Some(MethodToken::from_row(sem[1]));
            }
        }
        if getter.is_none() || setter.is_none() {
            let get_name = format!("get_{name}");
            let set_name = format!("set_{name}");
            for m in self.methods_of(type_token)? {
                if getter.is_none() && m.name == get_name {
                    getter = Some(m.token);
                }
                if setter.is_none() && m.name == set_name {
                    setter = Some(m.token);
                }
            }
        }
        Ok((getter, setter))
    }

    /// Generic parameter names declared on a type.
    pub fn generic_params(&self, token: TypeToken) -> Result<Vec<String>, FormatError> {
        let mut out = Vec::new();
        for row_index in 1..=self.tables.row_count(tables::GENERIC_PARAM) {
            let row = self.row(tables::GENERIC_PARAM, row_index)?;
            if let Some((tables::TYPE_DEF, target)) = CodedKind::TypeOrMethodDef.decode(row[2]) {
                if target == token.row() {
                    out.push(self.string(row[3])?.to_string());
                }
            }
        }
        Ok(out)
    }

    /// Types nested directly inside `token`.
    pub fn nested_types(&self, token: TypeToken) -> Result<Vec<TypeToken>, FormatError> {
        let mut out = Vec::new();
        for row_index in 1..=self.tables.row_count(tables::NESTED_CLASS) {
            let row = self.row(tables::NESTED_CLASS, row_index)?;
            if row[1] == token.row() {
                out.push(TypeToken::from_row(row[0]));
            }
        }
        Ok(out)
    }

    /// Enclosing type when `token` is nested.
    pub fn enclosing_type(&self, token: TypeToken) -> Option<TypeToken> {
        for row_index in 1..=self.tables.row_count(tables::NESTED_CLASS) {
            let row = self.row(tables::NESTED_CLASS, row_index).ok()?;
            if row[0] == token.row() {
                return Some(TypeToken::from_row(row[1]));
            }
        }
        None
    }

    // -- signature rendering --

    /// Render a signature type to a full name using this image's tables.
    pub fn sig_name(&self, sig: &TypeSig) -> String {
        if let Some(name) = sig.system_name() {
            return name.to_string();
        }
        match sig {
            TypeSig::Class(r) | TypeSig::ValueType(r) => self.sig_ref_name(r),
            TypeSig::SzArray(inner) => format!("{}[]", self.sig_name(inner)),
            TypeSig::Array(inner, rank) => {
                format!("{}[{}]", self.sig_name(inner), ",".repeat(*rank as usize - 1))
            }
            TypeSig::GenericInst { definition, args } => {
                let args: Vec<String> = args.iter().map(|a| self.sig_name(a)).collect();
                format!("{}<{}>", self.sig_name(definition), args.join(", "))
            }
            TypeSig::Var(n) => format!("!{n}"),
            TypeSig::MVar(n) => format!("!!{n}"),
            TypeSig::Ptr(inner) => format!("{}*", self.sig_name(inner)),
            TypeSig::ByRef(inner) => format!("{}&", self.sig_name(inner)),
            _ => "?".to_string(),
        }
    }

    fn sig_ref_name(&self, r: &SigTypeRef) -> String {
        match r.table {
            tables::TYPE_DEF => self
                .type_name(TypeToken::from_row(r.row))
                .unwrap_or_else(|_| "?".to_string()),
            tables::TYPE_REF => {
                let Ok(row) = self.row(tables::TYPE_REF, r.row) else {
                    return "?".to_string();
                };
                let name = self.string(row[1]).unwrap_or("?");
                let namespace = self.string(row[2]).unwrap_or("");
                if namespace.is_empty() {
                    name.to_string()
                } else {
                    format!("{namespace}.{name}")
                }
            }
            _ => "?".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
