// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for signature decoding

use super::*;

#[yare::parameterized(
    int32   = { &[0x06, 0x08][..], TypeSig::I4 },
    string  = { &[0x06, 0x0e][..], TypeSig::Str },
    boolean = { &[0x06, 0x02][..], TypeSig::Boolean },
    double  = { &[0x06, 0x0d][..], TypeSig::R8 },
    object  = { &[0x06, 0x1c][..], TypeSig::Object },
)]
fn field_primitives(blob: &[u8], expected: TypeSig) {
    assert_eq!(field_type(blob).unwrap(), expected);
}

#[test]
fn field_szarray_of_int() {
    let sig = field_type(&[0x06, 0x1d, 0x08]).unwrap();
    assert_eq!(sig, TypeSig::SzArray(Box::new(TypeSig::I4)));
    assert_eq!(sig.fixed_size(), Some(8));
    assert!(!sig.is_primitive());
}

#[test]
fn field_class_reference() {
    // ET_CLASS + TypeDefOrRefEncoded for TypeDef row 3: (3 << 2) | 0 = 12.
    let sig = field_type(&[0x06, 0x12, 12]).unwrap();
    assert_eq!(sig, TypeSig::Class(SigTypeRef { table: 0x02, row: 3 }));
}

#[test]
fn field_valuetype_via_typeref() {
    // ET_VALUETYPE + TypeDefOrRefEncoded for TypeRef row 2: (2 << 2) | 1 = 9.
    let sig = field_type(&[0x06, 0x11, 9]).unwrap();
    assert_eq!(sig, TypeSig::ValueType(SigTypeRef { table: 0x01, row: 2 }));
    assert_eq!(sig.fixed_size(), None);
}

#[test]
fn field_generic_instantiation() {
    // List<int>: GENERICINST CLASS <typeref row 1> argc=1 I4
    let sig = field_type(&[0x06, 0x15, 0x12, 0x05, 0x01, 0x08]).unwrap();
    let TypeSig::GenericInst { definition, args } = sig else {
        panic!("expected generic instantiation");
    };
    assert_eq!(*definition, TypeSig::Class(SigTypeRef { table: 0x01, row: 1 }));
    assert_eq!(args, vec![TypeSig::I4]);
}

#[test]
fn field_with_custom_modifier_is_skipped() {
    // CMOD_OPT <typeref 1> then I4.
    let sig = field_type(&[0x06, 0x20, 0x05, 0x08]).unwrap();
    assert_eq!(sig, TypeSig::I4);
}

#[test]
fn non_field_blob_is_rejected() {
    assert!(field_type(&[0x20, 0x00, 0x01]).is_err());
}

#[test]
fn instance_method_signature() {
    // HASTHIS, 1 param, returns void, takes string.
    let sig = method_sig(&[0x20, 0x01, 0x01, 0x0e]).unwrap();
    assert!(sig.has_this);
    assert_eq!(sig.generic_params, 0);
    assert_eq!(sig.return_type, TypeSig::Void);
    assert_eq!(sig.params, vec![TypeSig::Str]);
}

#[test]
fn property_getter_signature() {
    // PROPERTY|HASTHIS, 0 params, returns Int32.
    let sig = method_sig(&[0x28, 0x00, 0x08]).unwrap();
    assert_eq!(sig.return_type, TypeSig::I4);
    assert!(sig.params.is_empty());
}

#[test]
fn generic_method_signature_reads_arity() {
    // GENERIC|HASTHIS, 1 generic param, 1 param of !!0, returns void.
    let sig = method_sig(&[0x30, 0x01, 0x01, 0x01, 0x1e, 0x00]).unwrap();
    assert_eq!(sig.generic_params, 1);
    assert_eq!(sig.params, vec![TypeSig::MVar(0)]);
}

#[yare::parameterized(
    bool_is_1  = { TypeSig::Boolean, 1 },
    char_is_2  = { TypeSig::Char, 2 },
    int_is_4   = { TypeSig::I4, 4 },
    long_is_8  = { TypeSig::I8, 8 },
    ref_is_8   = { TypeSig::Str, 8 },
)]
fn fixed_sizes(sig: TypeSig, expected: u64) {
    assert_eq!(sig.fixed_size(), Some(expected));
}
