// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ECMA-335 `#~` table stream: layout computation and row access.
//!
//! Every table that can appear in an image or a portable PDB needs a row
//! size (tables are stored back to back), but only the tables the debugger
//! queries get typed accessors; the rest are skipped by size.

use crate::error::FormatError;
use crate::reader::Reader;

pub const TABLE_COUNT: usize = 0x38;

// Table ids referenced by name below.
pub const MODULE: u8 = 0x00;
pub const TYPE_REF: u8 = 0x01;
pub const TYPE_DEF: u8 = 0x02;
pub const FIELD: u8 = 0x04;
pub const METHOD_DEF: u8 = 0x06;
pub const PARAM: u8 = 0x08;
pub const INTERFACE_IMPL: u8 = 0x09;
pub const MEMBER_REF: u8 = 0x0a;
pub const CONSTANT: u8 = 0x0b;
pub const CUSTOM_ATTRIBUTE: u8 = 0x0c;
pub const FIELD_MARSHAL: u8 = 0x0d;
pub const DECL_SECURITY: u8 = 0x0e;
pub const CLASS_LAYOUT: u8 = 0x0f;
pub const FIELD_LAYOUT: u8 = 0x10;
pub const STAND_ALONE_SIG: u8 = 0x11;
pub const EVENT_MAP: u8 = 0x12;
pub const EVENT: u8 = 0x14;
pub const PROPERTY_MAP: u8 = 0x15;
pub const PROPERTY: u8 = 0x17;
pub const METHOD_SEMANTICS: u8 = 0x18;
pub const METHOD_IMPL: u8 = 0x19;
pub const MODULE_REF: u8 = 0x1a;
pub const TYPE_SPEC: u8 = 0x1b;
pub const IMPL_MAP: u8 = 0x1c;
pub const FIELD_RVA: u8 = 0x1d;
pub const ASSEMBLY: u8 = 0x20;
pub const ASSEMBLY_REF: u8 = 0x23;
pub const FILE: u8 = 0x26;
pub const EXPORTED_TYPE: u8 = 0x27;
pub const MANIFEST_RESOURCE: u8 = 0x28;
pub const NESTED_CLASS: u8 = 0x29;
pub const GENERIC_PARAM: u8 = 0x2a;
pub const METHOD_SPEC: u8 = 0x2b;
pub const GENERIC_PARAM_CONSTRAINT: u8 = 0x2c;
// Portable PDB tables.
pub const DOCUMENT: u8 = 0x30;
pub const METHOD_DEBUG_INFORMATION: u8 = 0x31;
pub const LOCAL_SCOPE: u8 = 0x32;
pub const LOCAL_VARIABLE: u8 = 0x33;
pub const LOCAL_CONSTANT: u8 = 0x34;
pub const IMPORT_SCOPE: u8 = 0x35;
pub const STATE_MACHINE_METHOD: u8 = 0x36;
pub const CUSTOM_DEBUG_INFORMATION: u8 = 0x37;

/// One column of a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Col {
    /// Fixed-width scalar of 1, 2 or 4 bytes.
    Fixed(u8),
    /// Index into #Strings.
    Str,
    /// Index into #GUID.
    Guid,
    /// Index into #Blob.
    Blob,
    /// Simple index into another table.
    Table(u8),
    /// Coded index over a fixed participant list.
    Coded(CodedKind),
}

/// Coded-index families (ECMA-335 II.24.2.6 plus the portable-PDB one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodedKind {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
    HasCustomDebugInformation,
}

impl CodedKind {
    /// Tag bit count and participating tables. `0xff` marks an unused slot.
    pub fn shape(self) -> (u32, &'static [u8]) {
        match self {
            CodedKind::TypeDefOrRef => (2, &[TYPE_DEF, TYPE_REF, TYPE_SPEC]),
            CodedKind::HasConstant => (2, &[FIELD, PARAM, PROPERTY]),
            CodedKind::HasCustomAttribute => (
                5,
                &[
                    METHOD_DEF,
                    FIELD,
                    TYPE_REF,
                    TYPE_DEF,
                    PARAM,
                    INTERFACE_IMPL,
                    MEMBER_REF,
                    MODULE,
                    DECL_SECURITY,
                    PROPERTY,
                    EVENT,
                    STAND_ALONE_SIG,
                    MODULE_REF,
                    TYPE_SPEC,
                    ASSEMBLY,
                    ASSEMBLY_REF,
                    FILE,
                    EXPORTED_TYPE,
                    MANIFEST_RESOURCE,
                    GENERIC_PARAM,
                    GENERIC_PARAM_CONSTRAINT,
                    METHOD_SPEC,
                ],
            ),
            CodedKind::HasFieldMarshal => (1, &[FIELD, PARAM]),
            CodedKind::HasDeclSecurity => (2, &[TYPE_DEF, METHOD_DEF, ASSEMBLY]),
            CodedKind::MemberRefParent => {
                (3, &[TYPE_DEF, TYPE_REF, MODULE_REF, METHOD_DEF, TYPE_SPEC])
            }
            CodedKind::HasSemantics => (1, &[EVENT, PROPERTY]),
            CodedKind::MethodDefOrRef => (1, &[METHOD_DEF, MEMBER_REF]),
            CodedKind::MemberForwarded => (1, &[FIELD, METHOD_DEF]),
            CodedKind::Implementation => (2, &[FILE, ASSEMBLY_REF, EXPORTED_TYPE]),
            CodedKind::CustomAttributeType => (3, &[0xff, 0xff, METHOD_DEF, MEMBER_REF, 0xff]),
            CodedKind::ResolutionScope => (2, &[MODULE, MODULE_REF, ASSEMBLY_REF, TYPE_REF]),
            CodedKind::TypeOrMethodDef => (1, &[TYPE_DEF, METHOD_DEF]),
            CodedKind::HasCustomDebugInformation => (
                5,
                &[
                    METHOD_DEF,
                    FIELD,
                    TYPE_REF,
                    TYPE_DEF,
                    PARAM,
                    INTERFACE_IMPL,
                    MEMBER_REF,
                    MODULE,
                    DECL_SECURITY,
                    PROPERTY,
                    EVENT,
                    STAND_ALONE_SIG,
                    MODULE_REF,
                    TYPE_SPEC,
                    ASSEMBLY,
                    ASSEMBLY_REF,
                    FILE,
                    EXPORTED_TYPE,
                    MANIFEST_RESOURCE,
                    GENERIC_PARAM,
                    GENERIC_PARAM_CONSTRAINT,
                    METHOD_SPEC,
                    DOCUMENT,
                    LOCAL_SCOPE,
                    LOCAL_VARIABLE,
                    LOCAL_CONSTANT,
                    IMPORT_SCOPE,
                ],
            ),
        }
    }

    /// Decode a coded value into `(table, row)`.
    pub fn decode(self, value: u32) -> Option<(u8, u32)> {
        let (bits, tables) = self.shape();
        let tag = (value & ((1 << bits) - 1)) as usize;
        let row = value >> bits;
        let table = *tables.get(tag)?;
        if table == 0xff {
            return None;
        }
        Some((table, row))
    }
}

/// Column schema for every table the stream may contain.
pub fn schema(table: u8) -> &'static [Col] {
    use Col::*;
    match table {
        MODULE => &[Fixed(2), Str, Guid, Guid, Guid],
        TYPE_REF => &[Coded(CodedKind::ResolutionScope), Str, Str],
        TYPE_DEF => &[
            Fixed(4),
            Str,
            Str,
            Coded(CodedKind::TypeDefOrRef),
            Table(FIELD),
            Table(METHOD_DEF),
        ],
        0x03 => &[Table(FIELD)],
        FIELD => &[Fixed(2), Str, Blob],
        0x05 => &[Table(METHOD_DEF)],
        METHOD_DEF => &[Fixed(4), Fixed(2), Fixed(2), Str, Blob, Table(PARAM)],
        0x07 => &[Table(PARAM)],
        PARAM => &[Fixed(2), Fixed(2), Str],
        INTERFACE_IMPL => &[Table(TYPE_DEF), Coded(CodedKind::TypeDefOrRef)],
        MEMBER_REF => &[Coded(CodedKind::MemberRefParent), Str, Blob],
        CONSTANT => &[Fixed(2), Coded(CodedKind::HasConstant), Blob],
        CUSTOM_ATTRIBUTE => &[
            Coded(CodedKind::HasCustomAttribute),
            Coded(CodedKind::CustomAttributeType),
            Blob,
        ],
        FIELD_MARSHAL => &[Coded(CodedKind::HasFieldMarshal), Blob],
        DECL_SECURITY => &[Fixed(2), Coded(CodedKind::HasDeclSecurity), Blob],
        CLASS_LAYOUT => &[Fixed(2), Fixed(4), Table(TYPE_DEF)],
        FIELD_LAYOUT => &[Fixed(4), Table(FIELD)],
        STAND_ALONE_SIG => &[Blob],
        EVENT_MAP => &[Table(TYPE_DEF), Table(EVENT)],
        0x13 => &[Table(EVENT)],
        EVENT => &[Fixed(2), Str, Coded(CodedKind::TypeDefOrRef)],
        PROPERTY_MAP => &[Table(TYPE_DEF), Table(PROPERTY)],
        0x16 => &[Table(PROPERTY)],
        PROPERTY => &[Fixed(2), Str, Blob],
        METHOD_SEMANTICS => &[Fixed(2), Table(METHOD_DEF), Coded(CodedKind::HasSemantics)],
        METHOD_IMPL => &[
            Table(TYPE_DEF),
            Coded(CodedKind::MethodDefOrRef),
            Coded(CodedKind::MethodDefOrRef),
        ],
        MODULE_REF => &[Str],
        TYPE_SPEC => &[Blob],
        IMPL_MAP => &[Fixed(2), Coded(CodedKind::MemberForwarded), Str, Table(MODULE_REF)],
        FIELD_RVA => &[Fixed(4), Table(FIELD)],
        0x1e => &[Fixed(4), Fixed(4)],
        0x1f => &[Fixed(4)],
        ASSEMBLY => &[
            Fixed(4),
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(4),
            Blob,
            Str,
            Str,
        ],
        0x21 => &[Fixed(4)],
        0x22 => &[Fixed(4), Fixed(4), Fixed(4)],
        ASSEMBLY_REF => &[
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(4),
            Blob,
            Str,
            Str,
            Blob,
        ],
        0x24 => &[Fixed(4), Table(ASSEMBLY_REF)],
        0x25 => &[Fixed(4), Fixed(4), Fixed(4), Table(ASSEMBLY_REF)],
        FILE => &[Fixed(4), Str, Blob],
        EXPORTED_TYPE => &[Fixed(4), Fixed(4), Str, Str, Coded(CodedKind::Implementation)],
        MANIFEST_RESOURCE => &[Fixed(4), Fixed(4), Str, Coded(CodedKind::Implementation)],
        NESTED_CLASS => &[Table(TYPE_DEF), Table(TYPE_DEF)],
        GENERIC_PARAM => &[Fixed(2), Fixed(2), Coded(CodedKind::TypeOrMethodDef), Str],
        METHOD_SPEC => &[Coded(CodedKind::MethodDefOrRef), Blob],
        GENERIC_PARAM_CONSTRAINT => &[Table(GENERIC_PARAM), Coded(CodedKind::TypeDefOrRef)],
        DOCUMENT => &[Blob, Guid, Blob, Guid],
        METHOD_DEBUG_INFORMATION => &[Table(DOCUMENT), Blob],
        LOCAL_SCOPE => &[
            Table(METHOD_DEF),
            Table(IMPORT_SCOPE),
            Table(LOCAL_VARIABLE),
            Table(LOCAL_CONSTANT),
            Fixed(4),
            Fixed(4),
        ],
        LOCAL_VARIABLE => &[Fixed(2), Fixed(2), Str],
        LOCAL_CONSTANT => &[Str, Blob],
        IMPORT_SCOPE => &[Table(IMPORT_SCOPE), Blob],
        STATE_MACHINE_METHOD => &[Table(METHOD_DEF), Table(METHOD_DEF)],
        CUSTOM_DEBUG_INFORMATION => &[Coded(CodedKind::HasCustomDebugInformation), Guid, Blob],
        _ => &[],
    }
}

/// Parsed `#~` stream directory: row counts and byte offsets per table,
/// relative to the surrounding buffer.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    pub wide_string: bool,
    pub wide_guid: bool,
    pub wide_blob: bool,
    rows: [u32; TABLE_COUNT],
    /// Row counts used for index sizing: local rows, or the referenced
    /// type-system counts from a portable PDB's `#Pdb` stream.
    sizing_rows: [u32; TABLE_COUNT],
    offsets: [usize; TABLE_COUNT],
    row_sizes: [usize; TABLE_COUNT],
}

impl TableDirectory {
    /// Parse the table-stream header at `stream_offset` within `data`.
    ///
    /// `external_rows` carries the referenced type-system row counts when
    /// parsing a portable PDB (zeroes otherwise).
    pub fn parse(
        data: &[u8],
        stream_offset: usize,
        external_rows: &[u32; TABLE_COUNT],
    ) -> Result<Self, FormatError> {
        let mut r = Reader::at(data, stream_offset)?;
        r.skip(4)?; // reserved
        r.skip(2)?; // major/minor version
        let heap_sizes = r.u8()?;
        r.skip(1)?; // reserved
        let valid = r.u64()?;
        r.skip(8)?; // sorted

        let mut rows = [0u32; TABLE_COUNT];
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                *count = r.u32()?;
            }
        }

        let mut sizing_rows = [0u32; TABLE_COUNT];
        for table in 0..TABLE_COUNT {
            sizing_rows[table] = rows[table].max(external_rows[table]);
        }

        let mut dir = Self {
            wide_string: heap_sizes & 0x01 != 0,
            wide_guid: heap_sizes & 0x02 != 0,
            wide_blob: heap_sizes & 0x04 != 0,
            rows,
            sizing_rows,
            offsets: [0; TABLE_COUNT],
            row_sizes: [0; TABLE_COUNT],
        };

        let mut offset = r.pos();
        for table in 0..TABLE_COUNT as u8 {
            let count = dir.rows[table as usize] as usize;
            if count == 0 {
                continue;
            }
            let size = dir.row_size(table);
            if size == 0 {
                return Err(FormatError::Unsupported("unknown metadata table present"));
            }
            dir.offsets[table as usize] = offset;
            dir.row_sizes[table as usize] = size;
            offset = offset
                .checked_add(size * count)
                .ok_or(FormatError::OutOfBounds { offset, needed: size })?;
        }
        if offset > data.len() {
            return Err(FormatError::OutOfBounds { offset, needed: 0 });
        }
        Ok(dir)
    }

    pub fn row_count(&self, table: u8) -> u32 {
        self.rows[table as usize]
    }

    fn table_index_wide(&self, table: u8) -> bool {
        self.sizing_rows[table as usize] > 0xffff
    }

    fn coded_index_wide(&self, kind: CodedKind) -> bool {
        let (bits, tables) = kind.shape();
        let max_rows = tables
            .iter()
            .filter(|t| **t != 0xff)
            .map(|t| self.sizing_rows[*t as usize])
            .max()
            .unwrap_or(0);
        max_rows >= (1u32 << (16 - bits))
    }

    fn col_width(&self, col: Col) -> usize {
        match col {
            Col::Fixed(n) => n as usize,
            Col::Str => {
                if self.wide_string {
                    4
                } else {
                    2
                }
            }
            Col::Guid => {
                if self.wide_guid {
                    4
                } else {
                    2
                }
            }
            Col::Blob => {
                if self.wide_blob {
                    4
                } else {
                    2
                }
            }
            Col::Table(t) => {
                if self.table_index_wide(t) {
                    4
                } else {
                    2
                }
            }
            Col::Coded(kind) => {
                if self.coded_index_wide(kind) {
                    4
                } else {
                    2
                }
            }
        }
    }

    fn row_size(&self, table: u8) -> usize {
        schema(table).iter().map(|c| self.col_width(*c)).sum()
    }

    /// Read all columns of `row` (1-based) as widened u32 values.
    pub fn read_row(&self, data: &[u8], table: u8, row: u32) -> Result<Vec<u32>, FormatError> {
        let count = self.rows[table as usize];
        if row == 0 || row > count {
            return Err(FormatError::RowOutOfRange { table: table_name(table), row });
        }
        let offset = self.offsets[table as usize]
            + (row as usize - 1) * self.row_sizes[table as usize];
        let mut r = Reader::at(data, offset)?;
        let mut values = Vec::with_capacity(schema(table).len());
        for col in schema(table) {
            let value = match self.col_width(*col) {
                1 => r.u8()? as u32,
                2 => r.u16()? as u32,
                4 => r.u32()?,
                _ => return Err(FormatError::Unsupported("bad column width")),
            };
            values.push(value);
        }
        Ok(values)
    }
}

fn table_name(table: u8) -> &'static str {
    match table {
        MODULE => "Module",
        TYPE_REF => "TypeRef",
        TYPE_DEF => "TypeDef",
        FIELD => "Field",
        METHOD_DEF => "MethodDef",
        PARAM => "Param",
        MEMBER_REF => "MemberRef",
        PROPERTY_MAP => "PropertyMap",
        PROPERTY => "Property",
        METHOD_SEMANTICS => "MethodSemantics",
        NESTED_CLASS => "NestedClass",
        GENERIC_PARAM => "GenericParam",
        ASSEMBLY => "Assembly",
        ASSEMBLY_REF => "AssemblyRef",
        DOCUMENT => "Document",
        METHOD_DEBUG_INFORMATION => "MethodDebugInformation",
        LOCAL_SCOPE => "LocalScope",
        LOCAL_VARIABLE => "LocalVariable",
        _ => "table",
    }
}

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tests;
