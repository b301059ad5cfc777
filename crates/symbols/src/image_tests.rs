// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the metadata reader over a synthetic assembly

use super::*;
use crate::testdata::build_test_assembly;
use ildbg_core::{MethodToken, TypeToken};
use std::path::Path;

fn image() -> Image {
    Image::from_bytes(build_test_assembly(), Path::new("/app/TestTarget.dll")).unwrap()
}

#[test]
fn names_and_lookup() {
    let img = image();
    assert_eq!(img.assembly_name().as_deref(), Some("TestTarget"));
    assert_eq!(img.module_name().as_deref(), Some("TestTarget.dll"));
    assert_eq!(img.type_count(), 3);
    assert_eq!(img.find_type("TestTarget.Person"), Some(TypeToken::from_row(3)));
    assert_eq!(img.find_type("TestTarget.Missing"), None);
    assert_eq!(img.type_name(TypeToken::from_row(2)).unwrap(), "TestTarget.BaseEntity");
}

#[test]
fn extends_chain_crosses_into_named_base() {
    let img = image();
    let person = TypeToken::from_row(3);
    let base = TypeToken::from_row(2);
    assert_eq!(img.extends(person).unwrap(), Some(TypeBase::InModule(base)));
    assert_eq!(
        img.extends(base).unwrap(),
        Some(TypeBase::Named("System.Object".to_string()))
    );
    assert_eq!(img.base_chain(person), vec![person, base]);
}

#[test]
fn member_ranges_split_between_types() {
    let img = image();
    let base = TypeToken::from_row(2);
    let person = TypeToken::from_row(3);

    let base_methods = img.methods_of(base).unwrap();
    assert_eq!(
        base_methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["get_Id"]
    );

    let person_methods = img.methods_of(person).unwrap();
    assert_eq!(
        person_methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec![".ctor", "SayHello", "get_Name"]
    );

    let person_fields = img.fields_of(person).unwrap();
    assert_eq!(
        person_fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["_name", "_age"]
    );
    assert_eq!(
        img.fields_of(base).unwrap()[0].name,
        "<Id>k__BackingField"
    );
}

#[test]
fn find_method_by_qualified_name() {
    let img = image();
    assert_eq!(
        img.find_method("TestTarget.Person.SayHello"),
        Some(MethodToken::from_row(3))
    );
    assert_eq!(img.find_method("TestTarget.Person.Nope"), None);
    assert_eq!(img.find_method("NoDots"), None);
}

#[test]
fn method_declaring_type_scans_ranges() {
    let img = image();
    assert_eq!(
        img.method_declaring_type(MethodToken::from_row(1)),
        Some(TypeToken::from_row(2))
    );
    assert_eq!(
        img.method_declaring_type(MethodToken::from_row(3)),
        Some(TypeToken::from_row(3))
    );
}

#[test]
fn properties_resolve_getters_through_semantics() {
    let img = image();
    let base = TypeToken::from_row(2);
    let props = img.properties_of(base).unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].name, "Id");
    assert_eq!(props[0].getter, Some(MethodToken::from_row(1)));
    assert_eq!(props[0].setter, None);

    assert_eq!(img.property_getter(base, "Id"), Some(MethodToken::from_row(1)));
    assert_eq!(
        img.property_getter(TypeToken::from_row(3), "Name"),
        Some(MethodToken::from_row(4))
    );
    assert_eq!(img.property_getter(base, "Nope"), None);
}

#[test]
fn field_lookup_is_declared_type_only() {
    let img = image();
    let person = TypeToken::from_row(3);
    assert!(img.field_by_name(person, "_name").is_some());
    // The backing field lives on the base type.
    assert!(img.field_by_name(person, "<Id>k__BackingField").is_none());
}

#[test]
fn sig_names_render_through_the_image() {
    let img = image();
    let person = TypeToken::from_row(3);
    let fields = img.fields_of(person).unwrap();
    let name_sig = fields[0].sig.as_ref().unwrap();
    assert_eq!(img.sig_name(name_sig), "System.String");
}

#[test]
fn bytes_that_are_not_managed_fail_open() {
    let err = Image::from_bytes(vec![0u8; 64], Path::new("/tmp/x.dll"));
    assert!(err.is_err());
}
