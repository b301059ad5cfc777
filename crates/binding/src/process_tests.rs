// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for process enumeration heuristics

use super::*;

#[yare::parameterized(
    dotnet_host      = { "dotnet", "dotnet TestTargetApp.dll", true },
    dotnet_exe       = { "dotnet.exe", "dotnet.exe run", true },
    dotnet_mixed     = { "DOTNET", "", true },
    apphost_with_dll = { "TestTargetApp", "TestTargetApp.dll --port 8080", true },
    native           = { "nginx", "nginx -g daemon off;", false },
    dll_substring    = { "cat", "cat my.dllx", false },
)]
fn managed_detection(name: &str, cmdline: &str, expected: bool) {
    assert_eq!(looks_managed(name, cmdline), expected);
}

#[test]
fn enumerate_lists_this_process() {
    let processes = enumerate_processes();
    let me = std::process::id();
    assert!(processes.iter().any(|p| p.pid == me));
}
