// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for metadata token encoding

use super::*;

#[test]
fn method_token_encodes_table_and_row() {
    let tok = MethodToken::from_row(14);
    assert_eq!(tok.raw(), 0x0600_000e);
    assert_eq!(tok.row(), 14);
    assert!(!tok.is_nil());
}

#[test]
fn type_token_row_zero_is_nil() {
    let tok = TypeToken::from_row(0);
    assert!(tok.is_nil());
    assert_eq!(tok.raw(), 0x0200_0000);
}

#[test]
fn field_token_display_is_hex() {
    let tok = FieldToken::from_row(0x2a);
    assert_eq!(tok.to_string(), "0x0400002a");
}

#[test]
fn row_masks_out_table_bits() {
    let tok = TypeToken(0x02ff_ffff);
    assert_eq!(tok.row(), 0x00ff_ffff);
}
