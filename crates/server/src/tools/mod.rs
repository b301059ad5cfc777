// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tool surface: maps MCP `tools/call` invocations onto engine
//! operations with per-call timeouts and structured error envelopes.
//!
//! Every response is `{success:true, …}` or `{error:true, code, message,
//! details?}`. Recoverable faults (pending binds, partial reads,
//! truncation) are successes with flags, never error envelopes.

mod breakpoints;
mod catalogue;
mod inspect;
mod modules;
mod session;

pub use catalogue::catalogue;

use crate::env;
use ildbg_core::Clock;
use ildbg_engine::{Engine, EngineError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Tool dispatcher bound to one engine.
pub struct Tools<C: Clock> {
    engine: Arc<Engine<C>>,
}

impl<C: Clock> Tools<C> {
    pub fn new(engine: Arc<Engine<C>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine<C>> {
        &self.engine
    }

    /// Invoke a tool by name. Always yields an envelope; never panics the
    /// transport.
    pub async fn dispatch(&self, name: &str, args: Value, cancel: &CancellationToken) -> Value {
        let started = std::time::Instant::now();
        let timeout = args
            .get("timeout_ms")
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
            .unwrap_or_else(env::tool_timeout);

        // Blocking waits honour their timeout precisely and report it as a
        // non-hit success rather than an error.
        let result = if name == "breakpoint_wait" {
            self.breakpoint_wait(args, timeout, cancel).await
        } else {
            match tokio::time::timeout(timeout, self.dispatch_inner(name, args, cancel)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout),
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(payload) => {
                info!(tool = name, elapsed_ms, outcome = "ok", "tool call");
                ok(payload)
            }
            Err(e) => {
                warn!(tool = name, elapsed_ms, outcome = "error", error = %e, "tool call");
                fail(&e)
            }
        }
    }

    async fn dispatch_inner(
        &self,
        name: &str,
        args: Value,
        _cancel: &CancellationToken,
    ) -> Result<Value, EngineError> {
        match name {
            "debug_launch" => self.debug_launch(args).await,
            "debug_attach" => self.debug_attach(args).await,
            "debug_disconnect" => self.debug_disconnect(args).await,
            "debug_state" => self.debug_state(),
            "debug_continue" => self.debug_continue(args).await,
            "debug_pause" => self.debug_pause().await,
            "debug_step_over" => self.debug_step(args, ildbg_binding::StepMode::Over).await,
            "debug_step_into" => self.debug_step(args, ildbg_binding::StepMode::Into).await,
            "debug_step_out" => self.debug_step(args, ildbg_binding::StepMode::Out).await,
            "debug_processes" => self.debug_processes(args).await,
            "breakpoint_set" => self.breakpoint_set(args).await,
            "breakpoint_remove" => self.breakpoint_remove(args).await,
            "breakpoint_list" => self.breakpoint_list(),
            "breakpoint_enable" => self.breakpoint_enable(args).await,
            "breakpoint_set_exception" => self.breakpoint_set_exception(args),
            "threads_list" => self.threads_list().await,
            "stacktrace_get" => self.stacktrace_get(args).await,
            "variables_get" => self.variables_get(args).await,
            "evaluate" => self.evaluate(args).await,
            "object_inspect" => self.object_inspect(args).await,
            "memory_read" => self.memory_read(args).await,
            "type_layout" => self.type_layout(args).await,
            "references_get" => self.references_get(args).await,
            "modules_list" => self.modules_list(args),
            "modules_get_types" => self.modules_get_types(args),
            "modules_get_members" => self.modules_get_members(args),
            "modules_search" => self.modules_search(args),
            other => Err(EngineError::InvalidArgument(format!("unknown tool '{other}'"))),
        }
    }
}

/// Parse tool arguments into a typed request.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, EngineError> {
    serde_json::from_value(args)
        .map_err(|e| EngineError::InvalidArgument(format!("bad arguments: {e}")))
}

/// Merge `success: true` into a payload object.
pub(crate) fn ok(mut payload: Value) -> Value {
    if let Some(map) = payload.as_object_mut() {
        map.insert("success".to_string(), Value::Bool(true));
        return payload;
    }
    json!({ "success": true, "result": payload })
}

/// Error envelope with the wire code and diagnosis details.
pub(crate) fn fail(error: &EngineError) -> Value {
    let mut envelope = json!({
        "error": true,
        "code": error.code().as_str(),
        "message": error.to_string(),
    });
    let details = match error {
        EngineError::Eval { kind, exception_type, .. } => {
            let mut details = json!({ "subcode": kind.as_str() });
            if let Some(ty) = exception_type {
                details["exception_type"] = json!(ty);
            }
            Some(details)
        }
        EngineError::Runtime { hresult, .. } => {
            Some(json!({ "hresult": format!("0x{hresult:08x}") }))
        }
        _ => None,
    };
    if let Some(details) = details {
        envelope["details"] = details;
    }
    envelope
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
