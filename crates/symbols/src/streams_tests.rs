// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the metadata root and heaps

use super::*;
use crate::testdata::MetadataBuilder;

#[test]
fn parses_stream_directory() {
    let mut b = MetadataBuilder::new();
    b.string("hello");
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    assert_eq!(root.version, "v4.0.30319");
    assert!(root.tables.is_some());
    assert!(root.strings.is_some());
    assert!(root.blob.is_some());
    assert!(root.guid.is_some());
    assert!(root.pdb.is_none());
}

#[test]
fn rejects_bad_signature() {
    let data = vec![0u8; 32];
    assert!(matches!(
        MetadataRoot::parse(&data, 0),
        Err(FormatError::BadMagic { .. })
    ));
}

#[test]
fn string_heap_roundtrip() {
    let mut b = MetadataBuilder::new();
    let index = b.string("TestTarget");
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    let heap = root.strings.unwrap().slice(&data).unwrap();
    assert_eq!(string_at(heap, index).unwrap(), "TestTarget");
    assert_eq!(string_at(heap, 0).unwrap(), "");
}

#[test]
fn blob_heap_roundtrip() {
    let mut b = MetadataBuilder::new();
    let index = b.blob(&[0x06, 0x08]);
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    let heap = root.blob.unwrap().slice(&data).unwrap();
    assert_eq!(blob_at(heap, index).unwrap(), &[0x06, 0x08]);
    assert_eq!(blob_at(heap, 0).unwrap(), &[] as &[u8]);
}

#[test]
fn guid_heap_is_one_based() {
    let mut b = MetadataBuilder::new();
    let index = b.guid();
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    let heap = root.guid.unwrap().slice(&data).unwrap();
    assert_eq!(index, 1);
    assert_eq!(guid_at(heap, 1).unwrap(), [0xaa; 16]);
    assert_eq!(guid_at(heap, 0).unwrap(), [0u8; 16]);
}

#[test]
fn pdb_stream_carries_external_row_counts() {
    let mut b = MetadataBuilder::new();
    b.pdb_stream(&[(crate::tables::METHOD_DEF, 42)]);
    let data = b.build();
    let root = MetadataRoot::parse(&data, 0).unwrap();
    let pdb = PdbStream::parse(&data, root.pdb.unwrap()).unwrap();
    assert_eq!(pdb.type_system_rows[crate::tables::METHOD_DEF as usize], 42);
    assert_eq!(pdb.type_system_rows[crate::tables::TYPE_DEF as usize], 0);
}
