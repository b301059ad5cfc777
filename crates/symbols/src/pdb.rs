// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Portable PDB reading: documents and sequence points.
//!
//! A portable PDB is itself a metadata blob; the debug tables
//! (`Document`, `MethodDebugInformation`, …) live in its `#~` stream and
//! `MethodDebugInformation` rows parallel the assembly's MethodDef rows.

use crate::error::{FormatError, SymbolError};
use crate::image::Image;
use crate::reader::Reader;
use crate::streams;
use crate::tables;
use ildbg_core::MethodToken;
use std::path::Path;

/// Compiler marker line for hidden sequence points.
pub const HIDDEN_LINE: u32 = 0x00fe_efee;

/// One decoded sequence point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePoint {
    /// Document table row the point maps into.
    pub document: u32,
    pub il_offset: u32,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub is_hidden: bool,
}

impl SequencePoint {
    /// True when `line:col` falls inside this point's span.
    pub fn span_contains(&self, line: u32, col: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && col < self.start_col {
            return false;
        }
        if line == self.end_line && col >= self.end_col {
            return false;
        }
        true
    }
}

/// A parsed standalone portable PDB.
pub struct PortablePdb {
    image: Image,
}

impl PortablePdb {
    pub fn open(path: &Path) -> Result<Self, SymbolError> {
        Ok(Self { image: Image::open(path)? })
    }

    pub fn from_bytes(data: Vec<u8>, path: &Path) -> Result<Self, FormatError> {
        Ok(Self { image: Image::from_bytes(data, path)? })
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn document_count(&self) -> u32 {
        self.image.tables().row_count(tables::DOCUMENT)
    }

    /// Decode a document name: separator byte, then blob-index parts.
    pub fn document_name(&self, row: u32) -> Result<String, FormatError> {
        let doc = self.image.tables().read_row(self.image.data(), tables::DOCUMENT, row)?;
        let name_blob = self.image.blob(doc[0])?;
        let mut r = Reader::new(name_blob);
        let separator = {
            let b = r.u8()?;
            if b == 0 {
                None
            } else {
                Some(b as char)
            }
        };
        let mut parts = Vec::new();
        while !r.is_empty() {
            let part_index = r.compressed_u32()?;
            if part_index == 0 {
                parts.push(String::new());
                continue;
            }
            let part = self.image.blob(part_index)?;
            parts.push(
                std::str::from_utf8(part)
                    .map_err(|_| FormatError::BadUtf8("document name"))?
                    .to_string(),
            );
        }
        let sep = separator.map(String::from).unwrap_or_default();
        Ok(parts.join(&sep))
    }

    /// Find a document by source path: exact match first, then a
    /// separator-insensitive suffix match so `MethodTarget.cs` finds
    /// `/src/MethodTarget.cs`.
    pub fn find_document(&self, file: &Path) -> Option<u32> {
        let wanted = file.to_string_lossy();
        let mut suffix_hit = None;
        for row in 1..=self.document_count() {
            let Ok(name) = self.document_name(row) else {
                continue;
            };
            if paths_equal(&name, &wanted) {
                return Some(row);
            }
            if suffix_hit.is_none() && path_suffix_matches(&name, &wanted) {
                suffix_hit = Some(row);
            }
        }
        suffix_hit
    }

    /// Decode the sequence points of a method. Empty when the method has
    /// no debug information (e.g. abstract or extern).
    pub fn sequence_points(&self, method: MethodToken) -> Result<Vec<SequencePoint>, FormatError> {
        let row_index = method.row();
        if row_index == 0
            || row_index > self.image.tables().row_count(tables::METHOD_DEBUG_INFORMATION)
        {
            return Ok(Vec::new());
        }
        let row = self.image.tables().read_row(
            self.image.data(),
            tables::METHOD_DEBUG_INFORMATION,
            row_index,
        )?;
        let initial_document = row[0];
        if row[1] == 0 {
            return Ok(Vec::new());
        }
        let blob = self.image.blob(row[1])?;
        decode_sequence_points(blob, initial_document)
    }

    /// MethodDef rows that have any sequence point in `document`.
    pub fn methods_in_document(&self, document: u32) -> Vec<MethodToken> {
        let count = self.image.tables().row_count(tables::METHOD_DEBUG_INFORMATION);
        let mut out = Vec::new();
        for row in 1..=count {
            let token = MethodToken::from_row(row);
            if let Ok(points) = self.sequence_points(token) {
                if points.iter().any(|p| p.document == document) {
                    out.push(token);
                }
            }
        }
        out
    }
}

/// Sequence-points blob decoder (Portable PDB spec).
fn decode_sequence_points(
    blob: &[u8],
    initial_document: u32,
) -> Result<Vec<SequencePoint>, FormatError> {
    let mut r = Reader::new(blob);
    let mut points = Vec::new();

    let _local_signature = r.compressed_u32()?;
    let mut document = if initial_document == 0 { r.compressed_u32()? } else { initial_document };

    let mut il_offset: u32 = 0;
    let mut prev_non_hidden: Option<(u32, u32)> = None;
    let mut first_record = true;

    while !r.is_empty() {
        let delta_il = r.compressed_u32()?;
        if !first_record && delta_il == 0 {
            // document-record: switch documents mid-method.
            document = r.compressed_u32()?;
            continue;
        }
        il_offset = if first_record { delta_il } else { il_offset + delta_il };
        first_record = false;

        let delta_lines = r.compressed_u32()?;
        let delta_cols =
            if delta_lines == 0 { r.compressed_u32()? as i32 } else { r.compressed_i32()? };

        if delta_lines == 0 && delta_cols == 0 {
            points.push(SequencePoint {
                document,
                il_offset,
                start_line: HIDDEN_LINE,
                start_col: 0,
                end_line: HIDDEN_LINE,
                end_col: 0,
                is_hidden: true,
            });
            continue;
        }

        let (start_line, start_col) = match prev_non_hidden {
            None => (r.compressed_u32()?, r.compressed_u32()?),
            Some((line, col)) => {
                let dl = r.compressed_i32()?;
                let dc = r.compressed_i32()?;
                (add_delta(line, dl), add_delta(col, dc))
            }
        };
        prev_non_hidden = Some((start_line, start_col));

        points.push(SequencePoint {
            document,
            il_offset,
            start_line,
            start_col,
            end_line: start_line + delta_lines,
            end_col: add_delta(start_col, delta_cols),
            is_hidden: false,
        });
    }
    Ok(points)
}

fn add_delta(base: u32, delta: i32) -> u32 {
    if delta >= 0 {
        base.saturating_add(delta as u32)
    } else {
        base.saturating_sub(delta.unsigned_abs())
    }
}

fn paths_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// True when `candidate` ends with all of `wanted`'s components.
fn path_suffix_matches(candidate: &str, wanted: &str) -> bool {
    let cand = normalize(candidate);
    let want = normalize(wanted);
    let cand_parts: Vec<&str> = cand.split('/').filter(|p| !p.is_empty()).collect();
    let want_parts: Vec<&str> = want.split('/').filter(|p| !p.is_empty()).collect();
    if want_parts.is_empty() || want_parts.len() > cand_parts.len() {
        return false;
    }
    cand_parts[cand_parts.len() - want_parts.len()..] == want_parts[..]
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

#[cfg(test)]
#[path = "pdb_tests.rs"]
mod tests;
