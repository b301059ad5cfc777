// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variable and value records produced by frame inspection.

use serde::{Deserialize, Serialize};

/// Where a variable came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Local,
    Argument,
    This,
    Field,
    Property,
    Element,
}

/// A materialised value.
///
/// Property values are only produced through funceval on a paused thread;
/// locals and arguments are read directly from the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Full type name, e.g. `System.String`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Short display rendering, e.g. `"World"` or `{Person}`.
    pub value: String,
    pub scope: VariableScope,
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<u32>,
    /// Expansion path to pass back through `variables_get{expand}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_path: Option<String>,
}

impl Variable {
    pub fn scalar(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
        scope: VariableScope,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
            scope,
            has_children: false,
            child_count: None,
            expand_path: None,
        }
    }
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
