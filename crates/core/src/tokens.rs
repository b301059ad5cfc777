// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata token newtypes shared between the symbol resolver, the metadata
//! reader and the engine.
//!
//! A token is `(table << 24) | row`. Row indices are 1-based; a zero row
//! means "nil" (e.g. a TypeDef that extends nothing).

use serde::{Deserialize, Serialize};

/// Table ids for the token kinds the debugger works with.
pub mod table {
    pub const TYPE_REF: u8 = 0x01;
    pub const TYPE_DEF: u8 = 0x02;
    pub const FIELD: u8 = 0x04;
    pub const METHOD_DEF: u8 = 0x06;
    pub const TYPE_SPEC: u8 = 0x1b;
}

macro_rules! define_token {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($table:expr);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const TABLE: u8 = $table;

            /// Build a token from a 1-based row index.
            pub fn from_row(row: u32) -> Self {
                Self(((Self::TABLE as u32) << 24) | (row & 0x00ff_ffff))
            }

            /// 1-based row index into the owning table. Zero means nil.
            pub fn row(self) -> u32 {
                self.0 & 0x00ff_ffff
            }

            /// True when the row part is zero.
            pub fn is_nil(self) -> bool {
                self.row() == 0
            }

            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{:08x}", self.0)
            }
        }
    };
}

define_token! {
    /// Token into the MethodDef table.
    pub struct MethodToken(table::METHOD_DEF);
}

define_token! {
    /// Token into the TypeDef table.
    pub struct TypeToken(table::TYPE_DEF);
}

define_token! {
    /// Token into the Field table.
    pub struct FieldToken(table::FIELD);
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
