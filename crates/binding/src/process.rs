// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host process enumeration with managed-runtime detection.

use crate::types::ProcessInfo;
use std::path::Path;
use sysinfo::System;

/// Names that mark a process as hosting the managed runtime.
const RUNTIME_HOST_NAMES: &[&str] = &["dotnet", "dotnet.exe"];

/// List all visible processes, flagging likely managed ones.
pub fn enumerate_processes() -> Vec<ProcessInfo> {
    let mut system = System::new();
    system.refresh_processes();
    let mut out: Vec<ProcessInfo> = system
        .processes()
        .iter()
        .map(|(pid, process)| {
            let executable = process.exe().map(Path::to_path_buf);
            ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                is_managed: looks_managed(process.name(), &process.cmd().join(" ")),
                executable,
            }
        })
        .collect();
    out.sort_by_key(|p| p.pid);
    out
}

/// Heuristic: the host binary is `dotnet`, or the command line names a
/// managed entry assembly. Apphost-deployed binaries are only caught when
/// their command line references a `.dll`.
fn looks_managed(name: &str, cmdline: &str) -> bool {
    if RUNTIME_HOST_NAMES.iter().any(|host| name.eq_ignore_ascii_case(host)) {
        return true;
    }
    cmdline.split_whitespace().any(|arg| arg.to_ascii_lowercase().ends_with(".dll"))
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
