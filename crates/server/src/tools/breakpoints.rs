// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint tools, including the blocking `breakpoint_wait`.

use super::{parse_args, Tools};
use ildbg_core::{BreakpointId, Clock};
use ildbg_engine::{BreakpointSpec, EngineError, StopReason, WaitOutcome};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize, Default)]
struct SetArgs {
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    hit_count: Option<u32>,
    #[serde(default)]
    log_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EnableArgs {
    id: String,
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ExceptionArgs {
    exception_type: String,
    #[serde(default = "default_true")]
    break_on_first_chance: bool,
    #[serde(default = "default_true")]
    break_on_second_chance: bool,
    #[serde(default = "default_true")]
    include_subtypes: bool,
}

#[derive(Debug, Deserialize, Default)]
struct WaitArgs {
    #[serde(default)]
    breakpoint_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl<C: Clock> Tools<C> {
    pub(super) async fn breakpoint_set(&self, args: Value) -> Result<Value, EngineError> {
        let args: SetArgs = parse_args(args)?;
        let outcome = self
            .engine()
            .set_breakpoint(BreakpointSpec {
                file: args.file,
                line: args.line,
                column: args.column,
                function: args.function,
                condition: args.condition,
                hit_count: args.hit_count,
                log_message: args.log_message,
            })
            .await?;
        let mut payload = json!({
            "id": outcome.id,
            "verified": outcome.verified,
        });
        if let Some(location) = outcome.location {
            payload["location"] = json!(location);
        }
        if let Some(message) = outcome.message {
            payload["message"] = json!(message);
        }
        Ok(payload)
    }

    pub(super) async fn breakpoint_remove(&self, args: Value) -> Result<Value, EngineError> {
        let args: IdArgs = parse_args(args)?;
        self.engine()
            .remove_breakpoint(&BreakpointId::from_string(args.id))
            .await?;
        Ok(json!({}))
    }

    pub(super) fn breakpoint_list(&self) -> Result<Value, EngineError> {
        Ok(json!({
            "breakpoints": self.engine().list_breakpoints(),
            "exception_breakpoints": self.engine().list_exception_breakpoints(),
        }))
    }

    pub(super) async fn breakpoint_enable(&self, args: Value) -> Result<Value, EngineError> {
        let args: EnableArgs = parse_args(args)?;
        let record = self
            .engine()
            .enable_breakpoint(&BreakpointId::from_string(args.id), args.enabled)
            .await?;
        Ok(json!({ "breakpoint": record }))
    }

    pub(super) fn breakpoint_set_exception(&self, args: Value) -> Result<Value, EngineError> {
        let args: ExceptionArgs = parse_args(args)?;
        let id = self.engine().set_exception_breakpoint(
            args.exception_type,
            args.break_on_first_chance,
            args.break_on_second_chance,
            args.include_subtypes,
        );
        Ok(json!({ "id": id }))
    }

    /// Block until a matching hit, the timeout, cancellation or target
    /// exit. Timeouts are successes with `hit:false`.
    pub(super) async fn breakpoint_wait(
        &self,
        args: Value,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value, EngineError> {
        let args: WaitArgs = parse_args(args)?;
        let filter = args.breakpoint_id.map(BreakpointId::from_string);
        let outcome = self
            .engine()
            .wait_for_hit(timeout, filter.as_ref(), cancel)
            .await;
        Ok(match outcome {
            WaitOutcome::TimedOut => json!({ "hit": false, "reason": "timeout" }),
            WaitOutcome::Cancelled => json!({ "hit": false, "reason": "cancelled" }),
            WaitOutcome::Hit(notice) => match &notice.reason {
                StopReason::Exited { exit_code } => {
                    json!({ "hit": false, "reason": "exited", "exit_code": exit_code })
                }
                StopReason::Breakpoint { id, hit_count, condition_error } => {
                    let mut payload = json!({
                        "hit": true,
                        "reason": "breakpoint",
                        "breakpoint_id": id,
                        "thread_id": notice.thread_id,
                        "hit_count": hit_count,
                    });
                    if let Some(location) = &notice.location {
                        payload["location"] = json!(location);
                    }
                    if let Some(error) = condition_error {
                        payload["condition_error"] = json!(error);
                    }
                    payload
                }
                StopReason::Exception { id, exception_type, message, is_first_chance } => {
                    json!({
                        "hit": true,
                        "reason": "exception",
                        "breakpoint_id": id,
                        "thread_id": notice.thread_id,
                        "exception": {
                            "type": exception_type,
                            "message": message,
                            "is_first_chance": is_first_chance,
                        },
                    })
                }
            },
        })
    }
}
