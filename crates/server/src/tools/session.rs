// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle and execution-control tools.

use super::{parse_args, Tools};
use ildbg_binding::{LaunchSpec, StepMode};
use ildbg_core::{Clock, SessionState};
use ildbg_engine::EngineError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct LaunchArgs {
    program: PathBuf,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    cwd: Option<PathBuf>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    stop_at_entry: bool,
}

#[derive(Debug, Deserialize)]
struct AttachArgs {
    pid: u32,
}

#[derive(Debug, Deserialize, Default)]
struct DisconnectArgs {
    #[serde(default)]
    terminate: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ThreadArgs {
    #[serde(default)]
    thread_id: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ProcessesArgs {
    #[serde(default)]
    managed_only: bool,
}

impl<C: Clock> Tools<C> {
    pub(super) async fn debug_launch(&self, args: Value) -> Result<Value, EngineError> {
        let args: LaunchArgs = parse_args(args)?;
        let spec = LaunchSpec {
            program: args.program,
            args: args.args,
            cwd: args.cwd,
            env: args.env,
            stop_at_entry: args.stop_at_entry,
        };
        let stop_at_entry = spec.stop_at_entry;
        let info = self.engine().launch(spec).await?;
        let (session, _) = self.engine().snapshot();
        Ok(json!({
            "pid": info.pid,
            "state": session.name(),
            "message": if stop_at_entry {
                "launched; stopped at entry"
            } else {
                "launched"
            },
        }))
    }

    pub(super) async fn debug_attach(&self, args: Value) -> Result<Value, EngineError> {
        let args: AttachArgs = parse_args(args)?;
        let info = self.engine().attach(args.pid).await?;
        Ok(json!({
            "pid": info.pid,
            "state": "running",
            "process_name": info.process_name,
            "runtime_version": info.runtime_version,
        }))
    }

    pub(super) async fn debug_disconnect(&self, args: Value) -> Result<Value, EngineError> {
        let args: DisconnectArgs = parse_args(args)?;
        self.engine().disconnect(args.terminate).await?;
        Ok(json!({
            "message": if args.terminate { "terminated and disconnected" } else { "disconnected" },
        }))
    }

    pub(super) fn debug_state(&self) -> Result<Value, EngineError> {
        let (session, info) = self.engine().snapshot();
        let mut payload = json!({ "state": session.name() });
        if let SessionState::Paused { reason, thread_id, location, breakpoint_id } = &session {
            payload["reason"] = json!(reason);
            payload["thread_id"] = json!(thread_id);
            if let Some(location) = location {
                payload["location"] = json!(location);
            }
            if let Some(id) = breakpoint_id {
                payload["breakpoint_id"] = json!(id);
            }
        }
        if let SessionState::Exited { exit_code } = &session {
            payload["exit_code"] = json!(exit_code);
        }
        if let Some(info) = info {
            payload["session"] = json!(info);
        }
        Ok(payload)
    }

    pub(super) async fn debug_continue(&self, args: Value) -> Result<Value, EngineError> {
        let _args: ThreadArgs = parse_args(args)?;
        self.engine().resume().await?;
        Ok(json!({ "state": "running" }))
    }

    pub(super) async fn debug_pause(&self) -> Result<Value, EngineError> {
        self.engine().pause().await?;
        Ok(json!({ "state": "pausing" }))
    }

    pub(super) async fn debug_step(
        &self,
        args: Value,
        mode: StepMode,
    ) -> Result<Value, EngineError> {
        let args: ThreadArgs = parse_args(args)?;
        self.engine().step(mode, args.thread_id).await?;
        Ok(json!({ "state": "running" }))
    }

    pub(super) async fn debug_processes(&self, args: Value) -> Result<Value, EngineError> {
        let args: ProcessesArgs = parse_args(args)?;
        let mut processes = self.engine().processes().await?;
        if args.managed_only {
            processes.retain(|p| p.is_managed);
        }
        Ok(json!({ "processes": processes }))
    }
}
