// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for image and symbol parsing.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed image: {0}")]
    Malformed(#[from] FormatError),

    #[error("{path} is not a managed assembly")]
    NotManaged { path: PathBuf },

    #[error("no symbols found for {path}")]
    NoSymbols { path: PathBuf },
}

/// Low-level structural errors from the binary readers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected end of data at offset {offset} (needed {needed} bytes)")]
    OutOfBounds { offset: usize, needed: usize },

    #[error("bad magic at offset {offset}: expected {expected}")]
    BadMagic { offset: usize, expected: &'static str },

    #[error("invalid compressed integer at offset {0}")]
    BadCompressedInt(usize),

    #[error("invalid UTF-8 in {0} heap")]
    BadUtf8(&'static str),

    #[error("missing required stream {0:?}")]
    MissingStream(&'static str),

    #[error("row {row} out of range for table {table}")]
    RowOutOfRange { table: &'static str, row: u32 },

    #[error("RVA 0x{0:x} not covered by any section")]
    UnmappedRva(u32),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}
