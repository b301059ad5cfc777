// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for error codes

use super::*;

#[yare::parameterized(
    not_attached = { ErrorCode::NotAttached, "not_attached" },
    not_stopped  = { ErrorCode::NotStopped, "not_stopped" },
    runtime      = { ErrorCode::TargetRuntimeError, "target_runtime_error" },
    null_ref     = { ErrorCode::NullReference, "null_reference" },
)]
fn code_wire_names(code: ErrorCode, expected: &str) {
    assert_eq!(code.as_str(), expected);
    assert_eq!(serde_json::to_value(code).unwrap(), expected);
}

#[test]
fn eval_kind_wire_names_match_display() {
    for kind in [
        EvalErrorKind::EvalTimeout,
        EvalErrorKind::EvalException,
        EvalErrorKind::EvalCancelled,
        EvalErrorKind::SyntaxError,
        EvalErrorKind::VariableUnavailable,
    ] {
        assert_eq!(serde_json::to_value(kind).unwrap(), kind.to_string());
    }
}
