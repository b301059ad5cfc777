// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// unsafe is denied everywhere except the FFI shim module.
#![deny(unsafe_code)]
// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ildbg-binding: the native debug seam.
//!
//! [`RuntimeBinding`] abstracts the runtime's debugging interface family:
//! attach/launch, the cooperative continue, IL breakpoints, steppers,
//! funceval and raw reads, with callbacks delivered over a channel. The
//! `dbgshim` feature adds the FFI bootstrap for the real debug shim;
//! `test-support` adds [`SimTarget`], a scripted in-memory target.

pub mod binding;
pub mod error;
pub mod process;
pub mod types;

#[cfg(feature = "dbgshim")]
pub mod shim;
#[cfg(feature = "dbgshim")]
pub mod shim_binding;

#[cfg(any(test, feature = "test-support"))]
pub mod sim;

pub use binding::RuntimeBinding;
pub use error::{BindingError, CORDBG_E_ILLEGAL_SHUTDOWN_ORDER};
#[cfg(feature = "dbgshim")]
pub use shim_binding::ShimBinding;
pub use process::enumerate_processes;
pub use types::{
    LaunchSpec, ProcessInfo, RawFrame, RawThread, RawValue, SessionHandle, SlotKind, StepMode,
    VariableSlot,
};

#[cfg(any(test, feature = "test-support"))]
pub use sim::{
    sim_module, EvalBehavior, SimException, SimObject, SimProgram, SimTarget, TracePoint,
};
