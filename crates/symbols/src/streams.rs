// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata root and heap streams (`#Strings`, `#Blob`, `#GUID`, `#US`,
//! `#Pdb`, `#~`).

use crate::error::FormatError;
use crate::pe::METADATA_SIGNATURE;
use crate::reader::Reader;
use crate::tables::TABLE_COUNT;

/// Byte range of a stream within the file buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamRange {
    pub offset: usize,
    pub size: usize,
}

impl StreamRange {
    pub fn slice<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], FormatError> {
        data.get(self.offset..self.offset + self.size)
            .ok_or(FormatError::OutOfBounds { offset: self.offset, needed: self.size })
    }
}

/// Parsed metadata root: version string plus the stream directory.
#[derive(Debug, Clone, Default)]
pub struct MetadataRoot {
    pub version: String,
    pub tables: Option<StreamRange>,
    pub strings: Option<StreamRange>,
    pub us: Option<StreamRange>,
    pub guid: Option<StreamRange>,
    pub blob: Option<StreamRange>,
    pub pdb: Option<StreamRange>,
}

impl MetadataRoot {
    /// Parse the stream directory at `root_offset` within `data`.
    pub fn parse(data: &[u8], root_offset: usize) -> Result<Self, FormatError> {
        let mut r = Reader::at(data, root_offset)?;
        if r.u32()? != METADATA_SIGNATURE {
            return Err(FormatError::BadMagic { offset: root_offset, expected: "BSJB" });
        }
        r.skip(4)?; // major/minor version
        r.skip(4)?; // reserved
        let version_len = r.u32()? as usize;
        let version_bytes = r.take(version_len)?;
        let version = version_bytes
            .split(|b| *b == 0)
            .next()
            .and_then(|s| std::str::from_utf8(s).ok())
            .unwrap_or("")
            .to_string();
        r.skip(2)?; // flags
        let stream_count = r.u16()?;

        let mut root = MetadataRoot { version, ..Default::default() };
        for _ in 0..stream_count {
            let offset = root_offset + r.u32()? as usize;
            let size = r.u32()? as usize;
            let name = r.cstr()?;
            // Stream names are padded to a 4-byte boundary including the null.
            r.align_to(4)?;
            let range = StreamRange { offset, size };
            match name {
                "#~" | "#-" => root.tables = Some(range),
                "#Strings" => root.strings = Some(range),
                "#US" => root.us = Some(range),
                "#GUID" => root.guid = Some(range),
                "#Blob" => root.blob = Some(range),
                "#Pdb" => root.pdb = Some(range),
                other => {
                    tracing::debug!(stream = other, "skipping unknown metadata stream");
                }
            }
        }
        Ok(root)
    }
}

/// Read a `#Strings` heap entry.
pub fn string_at(heap: &[u8], index: u32) -> Result<&str, FormatError> {
    let mut r = Reader::at(heap, index as usize)?;
    r.cstr()
}

/// Read a `#Blob` heap entry (compressed length prefix).
pub fn blob_at(heap: &[u8], index: u32) -> Result<&[u8], FormatError> {
    let mut r = Reader::at(heap, index as usize)?;
    let len = r.compressed_u32()? as usize;
    r.take(len)
}

/// Read a `#GUID` heap entry (1-based index into 16-byte slots).
pub fn guid_at(heap: &[u8], index: u32) -> Result<[u8; 16], FormatError> {
    if index == 0 {
        return Ok([0u8; 16]);
    }
    let offset = (index as usize - 1) * 16;
    let slice = heap
        .get(offset..offset + 16)
        .ok_or(FormatError::OutOfBounds { offset, needed: 16 })?;
    let mut guid = [0u8; 16];
    guid.copy_from_slice(slice);
    Ok(guid)
}

/// Parsed `#Pdb` stream header of a portable PDB.
#[derive(Debug, Clone)]
pub struct PdbStream {
    pub pdb_id: [u8; 20],
    pub entry_point: u32,
    /// Row counts of the type-system tables this PDB refers to, used for
    /// index sizing in the PDB's own table stream.
    pub type_system_rows: [u32; TABLE_COUNT],
}

impl PdbStream {
    pub fn parse(data: &[u8], range: StreamRange) -> Result<Self, FormatError> {
        let mut r = Reader::at(data, range.offset)?;
        let mut pdb_id = [0u8; 20];
        pdb_id.copy_from_slice(r.take(20)?);
        let entry_point = r.u32()?;
        let referenced = r.u64()?;
        let mut type_system_rows = [0u32; TABLE_COUNT];
        for (table, slot) in type_system_rows.iter_mut().enumerate() {
            if referenced & (1u64 << table) != 0 {
                *slot = r.u32()?;
            }
        }
        Ok(Self { pdb_id, entry_point, type_system_rows })
    }
}

#[cfg(test)]
#[path = "streams_tests.rs"]
mod tests;
