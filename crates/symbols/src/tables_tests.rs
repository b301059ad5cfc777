// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for table-stream layout and row access

use super::*;
use crate::streams::MetadataRoot;
use crate::testdata::MetadataBuilder;

fn build_one_typedef() -> (Vec<u8>, TableDirectory) {
    let mut b = MetadataBuilder::new();
    let name = b.string("Widget");
    let ns = b.string("App");
    b.row(MODULE, &[0, name, 0, 0, 0]);
    b.row(TYPE_DEF, &[0x0010_0001, name, ns, 0, 1, 1]);
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    let dir = TableDirectory::parse(&data, root.tables.unwrap().offset, &[0; TABLE_COUNT]).unwrap();
    (data, dir)
}

#[test]
fn row_counts_follow_the_valid_mask() {
    let (_, dir) = build_one_typedef();
    assert_eq!(dir.row_count(MODULE), 1);
    assert_eq!(dir.row_count(TYPE_DEF), 1);
    assert_eq!(dir.row_count(METHOD_DEF), 0);
}

#[test]
fn read_row_returns_schema_width_columns() {
    let (data, dir) = build_one_typedef();
    let row = dir.read_row(&data, TYPE_DEF, 1).unwrap();
    assert_eq!(row.len(), schema(TYPE_DEF).len());
    assert_eq!(row[0], 0x0010_0001); // flags survive as u32
    assert_eq!(row[4], 1); // field list
}

#[test]
fn row_zero_and_overflow_are_rejected() {
    let (data, dir) = build_one_typedef();
    assert!(dir.read_row(&data, TYPE_DEF, 0).is_err());
    assert!(dir.read_row(&data, TYPE_DEF, 2).is_err());
}

#[yare::parameterized(
    typedef_tag   = { CodedKind::TypeDefOrRef, 8, Some((TYPE_DEF, 2)) },
    typeref_tag   = { CodedKind::TypeDefOrRef, 5, Some((TYPE_REF, 1)) },
    typespec_tag  = { CodedKind::TypeDefOrRef, 6, Some((TYPE_SPEC, 1)) },
    property_tag  = { CodedKind::HasSemantics, 3, Some((PROPERTY, 1)) },
    event_tag     = { CodedKind::HasSemantics, 2, Some((EVENT, 1)) },
    res_assembly  = { CodedKind::ResolutionScope, 6, Some((ASSEMBLY_REF, 1)) },
)]
fn coded_index_decoding(kind: CodedKind, value: u32, expected: Option<(u8, u32)>) {
    assert_eq!(kind.decode(value), expected);
}

#[test]
fn custom_attribute_type_unused_tags_decode_to_none() {
    // Tags 0, 1 and 4 are reserved slots in CustomAttributeType.
    assert_eq!(CodedKind::CustomAttributeType.decode(0b000_001), None);
    assert_eq!(
        CodedKind::CustomAttributeType.decode(0b1_010),
        Some((METHOD_DEF, 1))
    );
}

#[test]
fn external_pdb_row_counts_do_not_add_local_rows() {
    let mut b = MetadataBuilder::new();
    let name = b.string("doc");
    b.row(MODULE, &[0, name, 0, 0, 0]);
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    let mut external = [0u32; TABLE_COUNT];
    external[METHOD_DEF as usize] = 100_000; // forces wide MethodDef indexes
    let dir = TableDirectory::parse(&data, root.tables.unwrap().offset, &external).unwrap();
    assert_eq!(dir.row_count(METHOD_DEF), 0);
}
