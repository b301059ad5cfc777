// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for inspection argument parsing

use super::*;

#[yare::parameterized(
    hex           = { "0x00007FF8A1234560", Some(0x0000_7FF8_A123_4560) },
    hex_upper     = { "0X10", Some(16) },
    decimal       = { "4096", Some(4096) },
    spaces        = { "  0x10  ", Some(16) },
    garbage       = { "zz", None },
    empty         = { "", None },
)]
fn address_parsing(text: &str, expected: Option<u64>) {
    match expected {
        Some(value) => assert_eq!(parse_address(text).unwrap(), value),
        None => assert!(parse_address(text).is_err()),
    }
}
