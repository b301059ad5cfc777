// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for module records

use super::*;

fn module(name: &str, path: Option<&str>) -> ModuleInfo {
    ModuleInfo {
        module_id: 1,
        name: name.to_string(),
        assembly_name: format!("{name}, Version=1.0.0.0"),
        path: path.map(PathBuf::from),
        version: Some("1.0.0.0".into()),
        is_managed: true,
        is_dynamic: false,
        has_symbols: true,
        base_address: 0x7f00_0000_0000,
        size: 0x10000,
    }
}

#[test]
fn basename_comes_from_path() {
    let m = module("TestTargetApp", Some("/app/bin/TestTargetApp.dll"));
    assert_eq!(m.basename().as_deref(), Some("TestTargetApp.dll"));
}

#[test]
fn dynamic_module_has_no_basename() {
    let m = module("Anon", None);
    assert_eq!(m.basename(), None);
}

#[yare::parameterized(
    corelib      = { "System.Private.CoreLib", true },
    system       = { "System", true },
    microsoft    = { "Microsoft.Extensions.Logging", true },
    mscorlib     = { "mscorlib", true },
    netstandard  = { "netstandard", true },
    user_code    = { "TestTargetApp", false },
    system_like  = { "SystemOfADown", false },
)]
fn system_module_detection(name: &str, expected: bool) {
    assert_eq!(module(name, None).is_system(), expected);
}
