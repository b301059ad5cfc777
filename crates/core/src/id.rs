// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint ID generation

use serde::{Deserialize, Serialize};

/// Prefix for source and function breakpoints.
pub const SOURCE_PREFIX: &str = "bp-";
/// Prefix for exception breakpoints.
pub const EXCEPTION_PREFIX: &str = "ex-";

/// Identifier for a breakpoint record: `bp-<uuid>` or `ex-<uuid>`.
///
/// The prefix encodes the breakpoint kind so callers (and log readers) can
/// tell source and exception breakpoints apart without a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointId(String);

impl BreakpointId {
    /// Generate a fresh id for a source or function breakpoint.
    pub fn new_source() -> Self {
        Self(format!("{}{}", SOURCE_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Generate a fresh id for an exception breakpoint.
    pub fn new_exception() -> Self {
        Self(format!("{}{}", EXCEPTION_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Create an id from an existing string (for parsing/deserialization).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `ex-` ids.
    pub fn is_exception(&self) -> bool {
        self.0.starts_with(EXCEPTION_PREFIX)
    }

    /// The uuid portion without the kind prefix.
    pub fn suffix(&self) -> &str {
        self.0
            .strip_prefix(SOURCE_PREFIX)
            .or_else(|| self.0.strip_prefix(EXCEPTION_PREFIX))
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BreakpointId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for BreakpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for BreakpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for BreakpointId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BreakpointId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for BreakpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
