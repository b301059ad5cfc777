// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module and type browsing tools.

use super::{parse_args, Tools};
use ildbg_core::{Clock, MemberKind};
use ildbg_engine::EngineError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, Default)]
struct ListArgs {
    #[serde(default)]
    include_system: bool,
}

#[derive(Debug, Deserialize)]
struct TypesArgs {
    module_name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MembersArgs {
    type_name: String,
    #[serde(default)]
    member_kinds: Option<Vec<MemberKind>>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    pattern: String,
    #[serde(default = "default_search_type")]
    search_type: String,
}

fn default_search_type() -> String {
    "all".to_string()
}

impl<C: Clock> Tools<C> {
    pub(super) fn modules_list(&self, args: Value) -> Result<Value, EngineError> {
        let args: ListArgs = parse_args(args)?;
        let modules = self.engine().modules_list(args.include_system)?;
        Ok(json!({ "modules": modules }))
    }

    pub(super) fn modules_get_types(&self, args: Value) -> Result<Value, EngineError> {
        let args: TypesArgs = parse_args(args)?;
        let types = self
            .engine()
            .module_types(&args.module_name, args.namespace.as_deref())?;
        Ok(json!({ "types": types }))
    }

    pub(super) fn modules_get_members(&self, args: Value) -> Result<Value, EngineError> {
        let args: MembersArgs = parse_args(args)?;
        let mut members = self.engine().type_members(&args.type_name)?;
        if let Some(kinds) = &args.member_kinds {
            members.retain(|m| kinds.contains(&m.kind));
        }
        Ok(json!({ "type": args.type_name, "members": members }))
    }

    pub(super) fn modules_search(&self, args: Value) -> Result<Value, EngineError> {
        let args: SearchArgs = parse_args(args)?;
        let (types, methods) = match args.search_type.as_str() {
            "types" => (true, false),
            "methods" => (false, true),
            "all" => (true, true),
            other => {
                return Err(EngineError::InvalidArgument(format!(
                    "search_type must be types, methods or all (got {other:?})"
                )));
            }
        };
        let results = self.engine().search_modules(&args.pattern, types, methods)?;
        Ok(json!({ "results": results }))
    }
}
