// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paused-target inspection tools.

use super::{parse_args, Tools};
use ildbg_core::{Clock, ReferenceDirection, VariableScope};
use ildbg_engine::EngineError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, Default)]
struct StackArgs {
    #[serde(default)]
    thread_id: Option<u32>,
    #[serde(default)]
    start_frame: u32,
    #[serde(default = "default_max_frames")]
    max_frames: u32,
}

fn default_max_frames() -> u32 {
    20
}

#[derive(Debug, Deserialize, Default)]
struct VariablesArgs {
    #[serde(default)]
    thread_id: Option<u32>,
    #[serde(default)]
    frame_index: u32,
    #[serde(default)]
    scope: Option<VariableScope>,
    #[serde(default)]
    expand: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvaluateArgs {
    expression: String,
    #[serde(default)]
    thread_id: Option<u32>,
    #[serde(default)]
    frame_index: u32,
}

#[derive(Debug, Deserialize)]
struct InspectArgs {
    object_ref: String,
    #[serde(default = "default_depth")]
    depth: u32,
    #[serde(default = "default_max_fields")]
    max_fields: usize,
}

fn default_depth() -> u32 {
    1
}

fn default_max_fields() -> usize {
    50
}

#[derive(Debug, Deserialize)]
struct MemoryArgs {
    address: String,
    size: usize,
}

#[derive(Debug, Deserialize)]
struct LayoutArgs {
    type_name: String,
    #[serde(default)]
    include_inherited: bool,
}

#[derive(Debug, Deserialize)]
struct ReferencesArgs {
    object_ref: String,
    direction: ReferenceDirection,
    #[serde(default = "default_max_refs")]
    max: usize,
}

fn default_max_refs() -> usize {
    20
}

impl<C: Clock> Tools<C> {
    pub(super) async fn threads_list(&self) -> Result<Value, EngineError> {
        let threads = self.engine().threads().await?;
        Ok(json!({ "threads": threads }))
    }

    pub(super) async fn stacktrace_get(&self, args: Value) -> Result<Value, EngineError> {
        let args: StackArgs = parse_args(args)?;
        let frames = self
            .engine()
            .stacktrace(args.thread_id, args.start_frame, args.max_frames)
            .await?;
        Ok(json!({ "frames": frames }))
    }

    pub(super) async fn variables_get(&self, args: Value) -> Result<Value, EngineError> {
        let args: VariablesArgs = parse_args(args)?;
        let variables = self
            .engine()
            .variables(args.thread_id, args.frame_index, args.scope, args.expand.as_deref())
            .await?;
        Ok(json!({ "variables": variables }))
    }

    pub(super) async fn evaluate(&self, args: Value) -> Result<Value, EngineError> {
        let args: EvaluateArgs = parse_args(args)?;
        let outcome = self
            .engine()
            .evaluate(&args.expression, args.thread_id, args.frame_index)
            .await?;
        let mut payload = json!({
            "result": outcome.result,
            "type": outcome.type_name,
            "has_children": outcome.has_children,
        });
        if !outcome.children.is_empty() {
            payload["children"] = json!(outcome.children);
        }
        Ok(payload)
    }

    pub(super) async fn object_inspect(&self, args: Value) -> Result<Value, EngineError> {
        let args: InspectArgs = parse_args(args)?;
        let inspection = self
            .engine()
            .object_inspect(&args.object_ref, args.depth, args.max_fields)
            .await?;
        Ok(serde_json::to_value(inspection)
            .map_err(|e| EngineError::InvalidArgument(e.to_string()))?)
    }

    pub(super) async fn memory_read(&self, args: Value) -> Result<Value, EngineError> {
        let args: MemoryArgs = parse_args(args)?;
        let address = parse_address(&args.address)?;
        let region = self.engine().read_memory(address, args.size).await?;
        Ok(serde_json::to_value(region)
            .map_err(|e| EngineError::InvalidArgument(e.to_string()))?)
    }

    pub(super) async fn type_layout(&self, args: Value) -> Result<Value, EngineError> {
        let args: LayoutArgs = parse_args(args)?;
        let layout = self
            .engine()
            .type_layout(&args.type_name, args.include_inherited)
            .await?;
        Ok(serde_json::to_value(layout)
            .map_err(|e| EngineError::InvalidArgument(e.to_string()))?)
    }

    pub(super) async fn references_get(&self, args: Value) -> Result<Value, EngineError> {
        let args: ReferencesArgs = parse_args(args)?;
        let result = self
            .engine()
            .references(&args.object_ref, args.direction, args.max)
            .await?;
        Ok(serde_json::to_value(result)
            .map_err(|e| EngineError::InvalidArgument(e.to_string()))?)
    }
}

/// Parse a `0x…` (or bare hex/decimal) address string.
fn parse_address(text: &str) -> Result<u64, EngineError> {
    let trimmed = text.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| EngineError::InvalidArgument(format!("bad address {text:?}")))
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
