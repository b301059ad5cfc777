// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module/type browsing DTOs for the `modules_*` tools.

use serde::{Deserialize, Serialize};

/// Summary of a type for `modules_get_types`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub full_name: String,
    /// Raw TypeDef token.
    pub token: u32,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Property,
    Field,
}

/// One member row for `modules_get_members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMember {
    pub name: String,
    pub kind: MemberKind,
    /// Rendered signature, e.g. `System.String (System.Int32)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub is_static: bool,
}

/// What a search hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Type,
    Method,
}

/// One hit for `modules_search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub module: String,
    pub name: String,
    pub kind: SearchKind,
    /// Declaring type for method hits; absent for type hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_type: Option<String>,
}

#[cfg(test)]
#[path = "browse_tests.rs"]
mod tests;
