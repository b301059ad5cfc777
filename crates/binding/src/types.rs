// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value and handle types crossing the binding boundary.
//!
//! Everything here is a snapshot: handles from the runtime are only valid
//! while the target is stopped, so the binding copies what the engine
//! needs instead of holding runtime interfaces alive.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A process visible to `enumerate_processes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// Best-effort managed-runtime detection.
    pub is_managed: bool,
}

/// Parameters for `create_process_for_launch`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub stop_at_entry: bool,
}

/// What attach/launch hand back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHandle {
    pub pid: u32,
    pub process_name: String,
    pub executable: Option<PathBuf>,
    pub runtime_version: Option<String>,
}

/// A value read from the target.
///
/// Composite values are carried by target address; the engine re-reads
/// fields through the binding rather than holding object graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Reference-type instance at a heap address.
    Object { address: u64, type_name: String },
    /// Inline value-type instance, addressed for field reads.
    Struct { address: u64, type_name: String },
    Array { address: u64, element_type: String, length: u32 },
}

impl RawValue {
    /// Full type name for display.
    pub fn type_name(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Bool(_) => "System.Boolean".to_string(),
            RawValue::Char(_) => "System.Char".to_string(),
            RawValue::I8(_) => "System.SByte".to_string(),
            RawValue::U8(_) => "System.Byte".to_string(),
            RawValue::I16(_) => "System.Int16".to_string(),
            RawValue::U16(_) => "System.UInt16".to_string(),
            RawValue::I32(_) => "System.Int32".to_string(),
            RawValue::U32(_) => "System.UInt32".to_string(),
            RawValue::I64(_) => "System.Int64".to_string(),
            RawValue::U64(_) => "System.UInt64".to_string(),
            RawValue::F32(_) => "System.Single".to_string(),
            RawValue::F64(_) => "System.Double".to_string(),
            RawValue::Str(_) => "System.String".to_string(),
            RawValue::Object { type_name, .. } | RawValue::Struct { type_name, .. } => {
                type_name.clone()
            }
            RawValue::Array { element_type, .. } => format!("{element_type}[]"),
        }
    }

    /// Short display rendering (strings quoted, composites braced).
    pub fn display(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Char(c) => format!("'{c}'"),
            RawValue::I8(n) => n.to_string(),
            RawValue::U8(n) => n.to_string(),
            RawValue::I16(n) => n.to_string(),
            RawValue::U16(n) => n.to_string(),
            RawValue::I32(n) => n.to_string(),
            RawValue::U32(n) => n.to_string(),
            RawValue::I64(n) => n.to_string(),
            RawValue::U64(n) => n.to_string(),
            RawValue::F32(n) => n.to_string(),
            RawValue::F64(n) => n.to_string(),
            RawValue::Str(s) => format!("{s:?}"),
            RawValue::Object { type_name, .. } | RawValue::Struct { type_name, .. } => {
                format!("{{{}}}", short_type_name(type_name))
            }
            RawValue::Array { element_type, length, .. } => {
                format!("{}[{}]", short_type_name(element_type), length)
            }
        }
    }

    /// Address for composite values; scalars have none.
    pub fn address(&self) -> Option<u64> {
        match self {
            RawValue::Object { address, .. }
            | RawValue::Struct { address, .. }
            | RawValue::Array { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// Whether `variables_get` should mark this expandable.
    pub fn has_children(&self) -> bool {
        matches!(
            self,
            RawValue::Object { .. } | RawValue::Struct { .. } | RawValue::Array { .. }
        )
    }
}

fn short_type_name(full: &str) -> &str {
    full.rsplit('.').next().unwrap_or(full)
}

/// How a variable slot was found in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    Local,
    Argument,
    This,
}

/// One local/argument read from a paused frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSlot {
    pub name: String,
    pub kind: SlotKind,
    pub value: RawValue,
}

/// One frame of a stopped thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// 0 = top of stack.
    pub index: u32,
    pub module_id: u64,
    pub method_token: ildbg_core::MethodToken,
    pub il_offset: u32,
    /// Render name when symbols are absent.
    pub function_name: Option<String>,
    pub is_external: bool,
}

/// A thread of the stopped target.
#[derive(Debug, Clone, PartialEq)]
pub struct RawThread {
    pub thread_id: u32,
    pub name: Option<String>,
    pub is_stopped: bool,
    pub is_waiting: bool,
}

/// Stepper mode, mapped onto the runtime's IL-range steppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    Over,
    Into,
    Out,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
