// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heap, memory and type-layout inspection views.

use serde::{Deserialize, Serialize};

/// One field of an inspected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectedField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<InspectedField>>,
}

/// Result of `object_inspect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInspection {
    /// Hex address in the target, e.g. `0x00007FF8A1234560`.
    pub address: String,
    pub type_name: String,
    /// Display rendering when the inspected expression is a scalar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub size: u64,
    pub fields: Vec<InspectedField>,
    pub is_null: bool,
    /// A cycle was found within the requested depth.
    pub has_circular_ref: bool,
    /// Field list was cut at `max_fields`.
    pub truncated: bool,
}

/// Result of `memory_read`. Partial reads are successes with
/// `actual_size < requested_size` and an error note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub address: String,
    pub requested_size: u64,
    pub actual_size: u64,
    /// Hex-encoded bytes.
    pub data: String,
    /// ASCII rendering, non-printables as `.`.
    pub ascii: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One field row of a `type_layout` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub offset: u64,
    pub size: u64,
    /// Name of the declaring type when inherited fields are included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_by: Option<String>,
}

/// A gap between consecutive fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddingRegion {
    pub offset: u64,
    pub size: u64,
}

/// Result of `type_layout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeLayout {
    pub type_name: String,
    pub total_size: u64,
    pub header_size: u64,
    pub data_size: u64,
    pub fields: Vec<FieldLayout>,
    pub padding: Vec<PaddingRegion>,
    pub is_value_type: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
}

/// Direction for `references_get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceDirection {
    /// Objects this object points at (field/element walk).
    Outbound,
    /// Objects pointing at this one (heap walk; may be sampled).
    Inbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub address: String,
    pub type_name: String,
    /// Field or element path that holds the reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

/// Result of `references_get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencesResult {
    pub address: String,
    pub direction: ReferenceDirection,
    pub references: Vec<ObjectReference>,
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
