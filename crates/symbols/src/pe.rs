// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal PE/COFF walk: just enough to find the CLI header and map the
//! metadata root of a managed assembly.
//!
//! Standalone portable PDBs skip all of this; they begin directly with the
//! `BSJB` metadata signature.

use crate::error::FormatError;
use crate::reader::Reader;

/// Index of the CLI header in the optional-header data directories.
const CLI_HEADER_DIRECTORY: usize = 14;

/// Magic at the start of every metadata root.
pub const METADATA_SIGNATURE: u32 = 0x424a_5342; // "BSJB"

#[derive(Debug, Clone)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_offset: u32,
    raw_size: u32,
}

/// Byte range of the metadata root inside a managed PE image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataLocation {
    pub offset: usize,
    pub size: usize,
}

/// Locate the CLI metadata root inside `data`.
///
/// Accepts either a PE image (`MZ`) or a bare metadata blob (`BSJB`, as in
/// standalone portable PDB files). Returns `Unsupported` for images with no
/// CLI directory (native DLLs).
pub fn locate_metadata(data: &[u8]) -> Result<MetadataLocation, FormatError> {
    let r = Reader::new(data);
    let magic = r.clone().u32()?;
    if magic == METADATA_SIGNATURE {
        return Ok(MetadataLocation { offset: 0, size: data.len() });
    }

    if r.clone().u16()? != 0x5a4d {
        return Err(FormatError::BadMagic { offset: 0, expected: "MZ or BSJB" });
    }

    // e_lfanew -> "PE\0\0"
    let mut r = Reader::at(data, 0x3c)?;
    let pe_offset = r.u32()? as usize;
    let mut r = Reader::at(data, pe_offset)?;
    if r.u32()? != 0x0000_4550 {
        return Err(FormatError::BadMagic { offset: pe_offset, expected: "PE\\0\\0" });
    }

    // COFF file header
    r.skip(2)?; // machine
    let section_count = r.u16()? as usize;
    r.skip(12)?; // timestamp, symbol table pointer, symbol count
    let optional_size = r.u16()? as usize;
    r.skip(2)?; // characteristics

    let optional_start = r.pos();
    let optional_magic = r.u16()?;
    let directories_offset = match optional_magic {
        0x010b => 96,  // PE32
        0x020b => 112, // PE32+
        _ => return Err(FormatError::BadMagic { offset: optional_start, expected: "PE32[+]" }),
    };

    let mut dir = Reader::at(data, optional_start + directories_offset + CLI_HEADER_DIRECTORY * 8)?;
    let cli_rva = dir.u32()?;
    let cli_size = dir.u32()?;
    if cli_rva == 0 || cli_size == 0 {
        return Err(FormatError::Unsupported("image has no CLI header"));
    }

    let sections = read_sections(data, optional_start + optional_size, section_count)?;

    // COR20 header: skip cb/versions, then the metadata directory.
    let cli_offset = rva_to_offset(&sections, cli_rva)?;
    let mut cli = Reader::at(data, cli_offset + 8)?;
    let metadata_rva = cli.u32()?;
    let metadata_size = cli.u32()? as usize;
    let offset = rva_to_offset(&sections, metadata_rva)?;

    let mut check = Reader::at(data, offset)?;
    if check.u32()? != METADATA_SIGNATURE {
        return Err(FormatError::BadMagic { offset, expected: "BSJB" });
    }
    Ok(MetadataLocation { offset, size: metadata_size })
}

fn read_sections(
    data: &[u8],
    table_offset: usize,
    count: usize,
) -> Result<Vec<Section>, FormatError> {
    let mut sections = Vec::with_capacity(count);
    let mut r = Reader::at(data, table_offset)?;
    for _ in 0..count {
        r.skip(8)?; // name
        let virtual_size = r.u32()?;
        let virtual_address = r.u32()?;
        let raw_size = r.u32()?;
        let raw_offset = r.u32()?;
        r.skip(16)?; // relocations, line numbers, characteristics
        sections.push(Section { virtual_address, virtual_size, raw_offset, raw_size });
    }
    Ok(sections)
}

fn rva_to_offset(sections: &[Section], rva: u32) -> Result<usize, FormatError> {
    for s in sections {
        let span = s.virtual_size.max(s.raw_size);
        if rva >= s.virtual_address && rva < s.virtual_address + span {
            return Ok((rva - s.virtual_address + s.raw_offset) as usize);
        }
    }
    Err(FormatError::UnmappedRva(rva))
}

#[cfg(test)]
#[path = "pe_tests.rs"]
mod tests;
