// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the module registry

use super::*;

fn module(id: u64, name: &str, path: Option<&str>) -> ModuleInfo {
    ModuleInfo {
        module_id: id,
        name: name.to_string(),
        assembly_name: name.to_string(),
        path: path.map(PathBuf::from),
        version: None,
        is_managed: true,
        is_dynamic: path.is_none(),
        has_symbols: true,
        base_address: 0,
        size: 0,
    }
}

#[test]
fn insert_and_lookup() {
    let mut reg = ModuleRegistry::new();
    reg.insert(module(1, "TestTargetApp", Some("/app/TestTargetApp.dll")));
    assert_eq!(reg.get(1).unwrap().name, "TestTargetApp");
    assert_eq!(reg.path_of(1).unwrap(), Path::new("/app/TestTargetApp.dll"));
    assert!(reg.by_name("testtargetapp").is_some());
    assert!(reg.by_name("other").is_none());
}

#[test]
fn dynamic_modules_have_no_path() {
    let mut reg = ModuleRegistry::new();
    reg.insert(module(1, "Anon", None));
    reg.insert(module(2, "TestTargetApp", Some("/app/TestTargetApp.dll")));
    assert_eq!(reg.with_paths(), vec![(2, PathBuf::from("/app/TestTargetApp.dll"))]);
}

#[test]
fn list_filters_system_modules() {
    let mut reg = ModuleRegistry::new();
    reg.insert(module(1, "System.Private.CoreLib", Some("/shared/S.P.C.dll")));
    reg.insert(module(2, "TestTargetApp", Some("/app/TestTargetApp.dll")));
    assert_eq!(reg.list(false).len(), 1);
    assert_eq!(reg.list(true).len(), 2);
}

#[test]
fn remove_returns_the_module() {
    let mut reg = ModuleRegistry::new();
    reg.insert(module(1, "TestTargetApp", None));
    assert!(reg.remove(1).is_some());
    assert!(reg.remove(1).is_none());
    assert!(reg.get(1).is_none());
}
