// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for engine error mapping

use super::*;

#[yare::parameterized(
    not_attached = { EngineError::NotAttached, ErrorCode::NotAttached },
    not_stopped  = { EngineError::NotStopped, ErrorCode::NotStopped },
    timeout      = { EngineError::Timeout, ErrorCode::Timeout },
    exited       = { EngineError::ProcessExited, ErrorCode::ProcessExited },
    null_ref     = { EngineError::NullReference("_currentUser".into()), ErrorCode::NullReference },
)]
fn codes(err: EngineError, expected: ErrorCode) {
    assert_eq!(err.code(), expected);
}

#[test]
fn binding_eval_exception_preserves_type() {
    let err: EngineError = BindingError::EvalException {
        exception_type: "System.NotSupportedException".into(),
        message: "nope".into(),
    }
    .into();
    assert_eq!(err.code(), ErrorCode::EvaluationFailed);
    assert_eq!(err.eval_kind(), Some(EvalErrorKind::EvalException));
    let EngineError::Eval { exception_type, .. } = err else {
        panic!("expected eval error");
    };
    assert_eq!(exception_type.as_deref(), Some("System.NotSupportedException"));
}

#[test]
fn binding_runtime_error_keeps_hresult() {
    let err: EngineError =
        BindingError::Runtime { hresult: 0x8013_1c30, message: "bad".into() }.into();
    let EngineError::Runtime { hresult, .. } = err else {
        panic!("expected runtime error");
    };
    assert_eq!(hresult, 0x8013_1c30);
}

#[test]
fn eval_aborted_maps_to_cancelled() {
    let err: EngineError = BindingError::EvalAborted.into();
    assert_eq!(err.eval_kind(), Some(EvalErrorKind::EvalCancelled));
}
