// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for expression values

use super::*;
use crate::error::EvalError;

#[yare::parameterized(
    int_int        = { Value::Int(5), Value::Int(5), true },
    int_float      = { Value::Int(5), Value::Float(5.0), true },
    null_null      = { Value::Null, Value::Null, true },
    null_int       = { Value::Null, Value::Int(0), false },
    str_str        = { Value::Str("a".into()), Value::Str("a".into()), true },
    str_int        = { Value::Str("5".into()), Value::Int(5), false },
    bool_bool      = { Value::Bool(true), Value::Bool(true), true },
    bool_int       = { Value::Bool(true), Value::Int(1), false },
)]
fn loose_equality(a: Value, b: Value, expected: bool) {
    assert_eq!(a.loose_eq(&b), expected);
    assert_eq!(b.loose_eq(&a), expected);
}

#[test]
fn numbers_order_across_int_and_float() {
    assert!(Value::Int(2).compare(&Value::Float(2.5)).unwrap().is_lt());
    assert!(Value::Float(3.0).compare(&Value::Int(3)).unwrap().is_eq());
}

#[test]
fn strings_do_not_order() {
    let err = Value::Str("a".into()).compare(&Value::Str("b".into()));
    assert!(matches!(err, Err(EvalError::TypeMismatch(_))));
}

#[test]
fn display_renders_bare_values() {
    assert_eq!(Value::Str("World".into()).to_string(), "World");
    assert_eq!(Value::Int(-3).to_string(), "-3");
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Bool(false).to_string(), "false");
}
