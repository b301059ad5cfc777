// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only builder for synthetic metadata images.
//!
//! Produces byte-exact `BSJB` blobs (narrow heaps, narrow indexes) so the
//! parsers are tested against real encodings rather than mocks.

use crate::tables::{schema, Col, TABLE_COUNT};
use std::collections::BTreeMap;

/// Encode an ECMA-335 compressed unsigned integer.
pub fn encode_u32(value: u32, out: &mut Vec<u8>) {
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.push(0x80 | (value >> 8) as u8);
        out.push(value as u8);
    } else {
        out.push(0xc0 | (value >> 24) as u8);
        out.push((value >> 16) as u8);
        out.push((value >> 8) as u8);
        out.push(value as u8);
    }
}

/// Encode an ECMA-335 compressed signed integer.
pub fn encode_i32(value: i32, out: &mut Vec<u8>) {
    let sign = if value < 0 { 1u32 } else { 0 };
    if (-0x40..0x40).contains(&value) {
        out.push((((value as u32 & 0x3f) << 1) | sign) as u8);
    } else if (-0x2000..0x2000).contains(&value) {
        let raw = ((value as u32 & 0x1fff) << 1) | sign;
        out.push(0x80 | (raw >> 8) as u8);
        out.push(raw as u8);
    } else {
        let raw = ((value as u32 & 0x0fff_ffff) << 1) | sign;
        out.push(0xc0 | (raw >> 24) as u8);
        out.push((raw >> 16) as u8);
        out.push((raw >> 8) as u8);
        out.push(raw as u8);
    }
}

/// Builds a metadata root with `#~`, `#Strings`, `#US`, `#GUID`, `#Blob`
/// and optionally `#Pdb` streams.
pub struct MetadataBuilder {
    strings: Vec<u8>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    rows: BTreeMap<u8, Vec<Vec<u32>>>,
    pdb_stream: Option<Vec<u8>>,
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self {
            strings: vec![0],
            blobs: vec![0],
            guids: Vec::new(),
            rows: BTreeMap::new(),
            pdb_stream: None,
        }
    }

    /// Intern a string, returning its heap index.
    pub fn string(&mut self, s: &str) -> u32 {
        let index = self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        index
    }

    /// Intern a blob, returning its heap index.
    pub fn blob(&mut self, data: &[u8]) -> u32 {
        let index = self.blobs.len() as u32;
        encode_u32(data.len() as u32, &mut self.blobs);
        self.blobs.extend_from_slice(data);
        index
    }

    /// Add a GUID, returning its 1-based index.
    pub fn guid(&mut self) -> u32 {
        self.guids.extend_from_slice(&[0xaa; 16]);
        (self.guids.len() / 16) as u32
    }

    /// Append a row (column values per the table schema). Returns the
    /// 1-based row index.
    pub fn row(&mut self, table: u8, values: &[u32]) -> u32 {
        assert_eq!(
            values.len(),
            schema(table).len(),
            "column count mismatch for table 0x{table:02x}"
        );
        let rows = self.rows.entry(table).or_default();
        rows.push(values.to_vec());
        rows.len() as u32
    }

    /// Attach a `#Pdb` stream referencing external type-system row counts.
    pub fn pdb_stream(&mut self, type_system_rows: &[(u8, u32)]) {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x11; 20]); // pdb id
        data.extend_from_slice(&0u32.to_le_bytes()); // entry point
        let mut referenced = 0u64;
        for (table, _) in type_system_rows {
            referenced |= 1u64 << table;
        }
        data.extend_from_slice(&referenced.to_le_bytes());
        let mut sorted: Vec<_> = type_system_rows.to_vec();
        sorted.sort_by_key(|(t, _)| *t);
        for (_, count) in sorted {
            data.extend_from_slice(&count.to_le_bytes());
        }
        self.pdb_stream = Some(data);
    }

    fn tables_stream(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.push(2); // major
        out.push(0); // minor
        out.push(0); // heap sizes: all narrow
        out.push(1); // reserved
        let mut valid = 0u64;
        for table in self.rows.keys() {
            valid |= 1u64 << table;
        }
        out.extend_from_slice(&valid.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes()); // sorted
        for rows in self.rows.values() {
            out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        }
        for (table, rows) in &self.rows {
            for row in rows {
                for (col, value) in schema(*table).iter().zip(row) {
                    match col {
                        Col::Fixed(1) => out.push(*value as u8),
                        Col::Fixed(4) => out.extend_from_slice(&value.to_le_bytes()),
                        _ => out.extend_from_slice(&(*value as u16).to_le_bytes()),
                    }
                }
            }
        }
        out
    }

    /// Serialize the metadata root.
    pub fn build(&self) -> Vec<u8> {
        let version = b"v4.0.30319\0\0";
        let mut streams: Vec<(&str, Vec<u8>)> = vec![("#~", self.tables_stream())];
        streams.push(("#Strings", self.strings.clone()));
        streams.push(("#US", vec![0]));
        streams.push(("#GUID", self.guids.clone()));
        streams.push(("#Blob", self.blobs.clone()));
        if let Some(pdb) = &self.pdb_stream {
            streams.push(("#Pdb", pdb.clone()));
        }

        let header_size: usize = 4 + 2 + 2 + 4 + 4 + version.len() + 2 + 2;
        let directory_size: usize =
            streams.iter().map(|(name, _)| 8 + pad4(name.len() + 1)).sum();

        let mut out = Vec::new();
        out.extend_from_slice(&0x424a_5342u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // major
        out.extend_from_slice(&1u16.to_le_bytes()); // minor
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.extend_from_slice(&(version.len() as u32).to_le_bytes());
        out.extend_from_slice(version);
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = header_size + directory_size;
        for (name, data) in &streams {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.push(0);
            for _ in name.len() + 1..pad4(name.len() + 1) {
                out.push(0);
            }
            offset += data.len();
        }
        for (_, data) in &streams {
            out.extend_from_slice(data);
        }
        out
    }
}

fn pad4(n: usize) -> usize {
    n.div_ceil(4) * 4
}

/// Encode a sequence-points blob for one method.
///
/// `points`: `(il_offset, Some((start_line, start_col, end_line,
/// end_col)))` for ordinary points, `None` span for hidden points.
pub fn sequence_points_blob(points: &[(u32, Option<(u32, u32, u32, u32)>)]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_u32(0, &mut out); // local signature
    let mut prev_il: Option<u32> = None;
    let mut prev_non_hidden: Option<(u32, u32)> = None;
    for (il_offset, span) in points {
        match prev_il {
            None => encode_u32(*il_offset, &mut out),
            Some(prev) => encode_u32(il_offset - prev, &mut out),
        }
        prev_il = Some(*il_offset);
        match span {
            None => {
                encode_u32(0, &mut out); // delta lines
                encode_u32(0, &mut out); // delta cols
            }
            Some((start_line, start_col, end_line, end_col)) => {
                let delta_lines = end_line - start_line;
                encode_u32(delta_lines, &mut out);
                if delta_lines == 0 {
                    encode_u32(end_col - start_col, &mut out);
                } else {
                    encode_i32(*end_col as i32 - *start_col as i32, &mut out);
                }
                match prev_non_hidden {
                    None => {
                        encode_u32(*start_line, &mut out);
                        encode_u32(*start_col, &mut out);
                    }
                    Some((pl, pc)) => {
                        encode_i32(*start_line as i32 - pl as i32, &mut out);
                        encode_i32(*start_col as i32 - pc as i32, &mut out);
                    }
                }
                prev_non_hidden = Some((*start_line, *start_col));
            }
        }
    }
    out
}

/// Builds the canonical test assembly used across the crate's tests:
///
/// ```text
/// TestTarget.BaseEntity : System.Object   { int <Id>k__BackingField; int get_Id(); Id }
/// TestTarget.Person     : BaseEntity      { string _name; int _age; .ctor; SayHello(string); get_Name(); Name }
/// ```
pub fn build_test_assembly() -> Vec<u8> {
    use crate::tables;

    let mut b = MetadataBuilder::new();

    let module_name = b.string("TestTarget.dll");
    let ns_system = b.string("System");
    let name_object = b.string("Object");
    let ns_app = b.string("TestTarget");
    let name_module_type = b.string("<Module>");
    let name_base = b.string("BaseEntity");
    let name_person = b.string("Person");
    let f_backing = b.string("<Id>k__BackingField");
    let f_name = b.string("_name");
    let f_age = b.string("_age");
    let m_get_id = b.string("get_Id");
    let m_ctor = b.string(".ctor");
    let m_say_hello = b.string("SayHello");
    let m_get_name = b.string("get_Name");
    let p_id = b.string("Id");
    let p_name = b.string("Name");
    let asm_name = b.string("TestTarget");
    let corelib = b.string("System.Runtime");

    let sig_field_i4 = b.blob(&[0x06, 0x08]);
    let sig_field_str = b.blob(&[0x06, 0x0e]);
    let sig_get_i4 = b.blob(&[0x20, 0x00, 0x08]);
    let sig_ctor = b.blob(&[0x20, 0x00, 0x01]);
    let sig_say_hello = b.blob(&[0x20, 0x01, 0x01, 0x0e]);
    let sig_get_str = b.blob(&[0x20, 0x00, 0x0e]);
    let sig_prop_i4 = b.blob(&[0x28, 0x00, 0x08]);
    let sig_prop_str = b.blob(&[0x28, 0x00, 0x0e]);

    let mvid = b.guid();
    b.row(tables::MODULE, &[0, module_name, mvid, 0, 0]);

    // TypeRef 1: System.Object in AssemblyRef 1.
    let scope = (1 << 2) | 2; // ResolutionScope: AssemblyRef row 1
    b.row(tables::TYPE_REF, &[scope, name_object, ns_system]);

    // TypeDefs. Extends coding: TypeRef row r -> (r << 2) | 1, TypeDef row r -> (r << 2).
    b.row(tables::TYPE_DEF, &[0, name_module_type, 0, 0, 1, 1]);
    b.row(tables::TYPE_DEF, &[0x0010_0001, name_base, ns_app, (1 << 2) | 1, 1, 1]);
    b.row(tables::TYPE_DEF, &[0x0010_0001, name_person, ns_app, 2 << 2, 2, 2]);

    b.row(tables::FIELD, &[0x0001, f_backing, sig_field_i4]);
    b.row(tables::FIELD, &[0x0001, f_name, sig_field_str]);
    b.row(tables::FIELD, &[0x0001, f_age, sig_field_i4]);

    b.row(tables::METHOD_DEF, &[0, 0, 0x0886, m_get_id, sig_get_i4, 1]);
    b.row(tables::METHOD_DEF, &[0, 0, 0x1886, m_ctor, sig_ctor, 1]);
    b.row(tables::METHOD_DEF, &[0, 0, 0x0006, m_say_hello, sig_say_hello, 1]);
    b.row(tables::METHOD_DEF, &[0, 0, 0x0886, m_get_name, sig_get_str, 1]);

    b.row(tables::PROPERTY_MAP, &[2, 1]);
    b.row(tables::PROPERTY_MAP, &[3, 2]);
    b.row(tables::PROPERTY, &[0, p_id, sig_prop_i4]);
    b.row(tables::PROPERTY, &[0, p_name, sig_prop_str]);

    // MethodSemantics: HasSemantics for Property row r -> (r << 1) | 1.
    b.row(tables::METHOD_SEMANTICS, &[0x0002, 1, (1 << 1) | 1]);
    b.row(tables::METHOD_SEMANTICS, &[0x0002, 4, (2 << 1) | 1]);

    b.row(tables::ASSEMBLY, &[0x8004, 1, 0, 0, 0, 0, 0, asm_name, 0]);
    b.row(tables::ASSEMBLY_REF, &[8, 0, 0, 0, 0, 0, corelib, 0, 0]);

    b.build()
}

/// Builds the portable PDB matching [`build_test_assembly`]:
///
/// - document 1: `/src/MethodTarget.cs`
/// - `get_Id` (method 1): one point on line 8
/// - `.ctor` (method 2): no debug info
/// - `SayHello` (method 3): lines 13, 14, 15, 17 plus a hidden point
/// - `get_Name` (method 4): two points on line 14 (columns 5 and 20)
pub fn build_test_pdb() -> Vec<u8> {
    use crate::tables;

    let mut b = MetadataBuilder::new();
    b.pdb_stream(&[(tables::METHOD_DEF, 4)]);

    let doc_name = document_name_blob(&mut b, "/src/MethodTarget.cs");
    let hash_alg = b.guid();
    let language = b.guid();
    b.row(tables::DOCUMENT, &[doc_name, hash_alg, 0, language]);

    let get_id_points = sequence_points_blob(&[(0, Some((8, 9, 8, 20)))]);
    let say_hello_points = sequence_points_blob(&[
        (0, Some((13, 9, 13, 30))),
        (6, Some((14, 9, 14, 40))),
        (12, None),
        (18, Some((15, 9, 15, 20))),
        (24, Some((17, 5, 17, 6))),
    ]);
    let get_name_points =
        sequence_points_blob(&[(0, Some((14, 5, 14, 15))), (8, Some((14, 20, 14, 35)))]);

    let get_id_blob = b.blob(&get_id_points);
    let say_hello_blob = b.blob(&say_hello_points);
    let get_name_blob = b.blob(&get_name_points);

    b.row(tables::METHOD_DEBUG_INFORMATION, &[1, get_id_blob]);
    b.row(tables::METHOD_DEBUG_INFORMATION, &[0, 0]);
    b.row(tables::METHOD_DEBUG_INFORMATION, &[1, say_hello_blob]);
    b.row(tables::METHOD_DEBUG_INFORMATION, &[1, get_name_blob]);

    b.build()
}

/// Encode a document-name blob (`/`-separated) and return the part blobs
/// that must be interned first. Call as:
/// `let name_blob = document_name_blob(&mut builder, "/src/File.cs");`
pub fn document_name_blob(builder: &mut MetadataBuilder, path: &str) -> u32 {
    let mut name = Vec::new();
    name.push(b'/');
    for part in path.split('/') {
        if part.is_empty() {
            encode_u32(0, &mut name);
        } else {
            let index = builder.blob(part.as_bytes());
            encode_u32(index, &mut name);
        }
    }
    builder.blob(&name)
}
