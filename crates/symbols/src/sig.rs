// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signature blob decoding (ECMA-335 II.23.2), limited to what the
//! debugger needs: classifying field types, naming them, and sizing them
//! for layout computation.

use crate::error::FormatError;
use crate::reader::Reader;

// ELEMENT_TYPE_* constants.
const ET_VOID: u8 = 0x01;
const ET_BOOLEAN: u8 = 0x02;
const ET_CHAR: u8 = 0x03;
const ET_I1: u8 = 0x04;
const ET_U1: u8 = 0x05;
const ET_I2: u8 = 0x06;
const ET_U2: u8 = 0x07;
const ET_I4: u8 = 0x08;
const ET_U4: u8 = 0x09;
const ET_I8: u8 = 0x0a;
const ET_U8: u8 = 0x0b;
const ET_R4: u8 = 0x0c;
const ET_R8: u8 = 0x0d;
const ET_STRING: u8 = 0x0e;
const ET_PTR: u8 = 0x0f;
const ET_BYREF: u8 = 0x10;
const ET_VALUETYPE: u8 = 0x11;
const ET_CLASS: u8 = 0x12;
const ET_VAR: u8 = 0x13;
const ET_ARRAY: u8 = 0x14;
const ET_GENERICINST: u8 = 0x15;
const ET_I: u8 = 0x18;
const ET_U: u8 = 0x19;
const ET_OBJECT: u8 = 0x1c;
const ET_SZARRAY: u8 = 0x1d;
const ET_MVAR: u8 = 0x1e;
const ET_CMOD_REQD: u8 = 0x1f;
const ET_CMOD_OPT: u8 = 0x20;

const SIG_FIELD: u8 = 0x06;
const SIG_GENERIC: u8 = 0x10;

/// A type reference from a signature: `(table, row)` where table is
/// TypeDef (0x02), TypeRef (0x01) or TypeSpec (0x1b).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigTypeRef {
    pub table: u8,
    pub row: u32,
}

/// Decoded type from a field or parameter signature.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSig {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    IntPtr,
    UIntPtr,
    Str,
    Object,
    /// Reference type defined in metadata.
    Class(SigTypeRef),
    /// Value type defined in metadata; size needs a metadata lookup.
    ValueType(SigTypeRef),
    /// Single-dimension array.
    SzArray(Box<TypeSig>),
    /// Multi-dimension array (rank recorded, bounds dropped).
    Array(Box<TypeSig>, u32),
    /// Generic instantiation, e.g. `List<int>`.
    GenericInst { definition: Box<TypeSig>, args: Vec<TypeSig> },
    /// Generic type parameter (`!n`).
    Var(u32),
    /// Generic method parameter (`!!n`).
    MVar(u32),
    Ptr(Box<TypeSig>),
    ByRef(Box<TypeSig>),
}

impl TypeSig {
    /// Size in bytes within an object layout; reference types take a slot.
    /// Metadata-defined value types return `None` (caller sums their fields).
    pub fn fixed_size(&self) -> Option<u64> {
        match self {
            TypeSig::Boolean | TypeSig::I1 | TypeSig::U1 => Some(1),
            TypeSig::Char | TypeSig::I2 | TypeSig::U2 => Some(2),
            TypeSig::I4 | TypeSig::U4 | TypeSig::R4 => Some(4),
            TypeSig::I8 | TypeSig::U8 | TypeSig::R8 => Some(8),
            TypeSig::IntPtr | TypeSig::UIntPtr | TypeSig::Ptr(_) | TypeSig::ByRef(_) => Some(8),
            TypeSig::Str
            | TypeSig::Object
            | TypeSig::Class(_)
            | TypeSig::SzArray(_)
            | TypeSig::Array(..)
            | TypeSig::GenericInst { .. } => Some(8),
            TypeSig::ValueType(_) => None,
            TypeSig::Var(_) | TypeSig::MVar(_) => Some(8),
            TypeSig::Void => Some(0),
        }
    }

    /// True for primitives rendered inline (no children to expand).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeSig::Boolean
                | TypeSig::Char
                | TypeSig::I1
                | TypeSig::U1
                | TypeSig::I2
                | TypeSig::U2
                | TypeSig::I4
                | TypeSig::U4
                | TypeSig::I8
                | TypeSig::U8
                | TypeSig::R4
                | TypeSig::R8
                | TypeSig::IntPtr
                | TypeSig::UIntPtr
                | TypeSig::Str
        )
    }

    /// System name for well-known element types; metadata-defined types
    /// render through the image's name resolver instead.
    pub fn system_name(&self) -> Option<&'static str> {
        Some(match self {
            TypeSig::Void => "System.Void",
            TypeSig::Boolean => "System.Boolean",
            TypeSig::Char => "System.Char",
            TypeSig::I1 => "System.SByte",
            TypeSig::U1 => "System.Byte",
            TypeSig::I2 => "System.Int16",
            TypeSig::U2 => "System.UInt16",
            TypeSig::I4 => "System.Int32",
            TypeSig::U4 => "System.UInt32",
            TypeSig::I8 => "System.Int64",
            TypeSig::U8 => "System.UInt64",
            TypeSig::R4 => "System.Single",
            TypeSig::R8 => "System.Double",
            TypeSig::IntPtr => "System.IntPtr",
            TypeSig::UIntPtr => "System.UIntPtr",
            TypeSig::Str => "System.String",
            TypeSig::Object => "System.Object",
            _ => return None,
        })
    }
}

/// Decode a Field signature blob to its type.
pub fn field_type(blob: &[u8]) -> Result<TypeSig, FormatError> {
    let mut r = Reader::new(blob);
    let header = r.u8()?;
    if header & 0x0f != SIG_FIELD {
        return Err(FormatError::Unsupported("not a field signature"));
    }
    skip_custom_mods(&mut r)?;
    decode_type(&mut r)
}

/// Decoded method signature header: parameter count and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub has_this: bool,
    pub generic_params: u32,
    pub return_type: TypeSig,
    pub params: Vec<TypeSig>,
}

/// Decode a MethodDef signature blob. PROPERTY signatures (0x08) share the
/// same shape and decode through here as well.
pub fn method_sig(blob: &[u8]) -> Result<MethodSig, FormatError> {
    let mut r = Reader::new(blob);
    let header = r.u8()?;
    let generic_params = if header & SIG_GENERIC != 0 { r.compressed_u32()? } else { 0 };
    let param_count = r.compressed_u32()?;
    skip_custom_mods(&mut r)?;
    let return_type = decode_type(&mut r)?;
    let mut params = Vec::with_capacity(param_count as usize);
    for _ in 0..param_count {
        skip_custom_mods(&mut r)?;
        params.push(decode_type(&mut r)?);
    }
    Ok(MethodSig { has_this: header & 0x20 != 0, generic_params, return_type, params })
}

fn skip_custom_mods(r: &mut Reader<'_>) -> Result<(), FormatError> {
    loop {
        let mut peek = r.clone();
        match peek.u8() {
            Ok(ET_CMOD_OPT) | Ok(ET_CMOD_REQD) => {
                r.u8()?;
                r.compressed_u32()?; // TypeDefOrRefEncoded
            }
            _ => return Ok(()),
        }
    }
}

fn decode_type(r: &mut Reader<'_>) -> Result<TypeSig, FormatError> {
    let element = r.u8()?;
    Ok(match element {
        ET_VOID => TypeSig::Void,
        ET_BOOLEAN => TypeSig::Boolean,
        ET_CHAR => TypeSig::Char,
        ET_I1 => TypeSig::I1,
        ET_U1 => TypeSig::U1,
        ET_I2 => TypeSig::I2,
        ET_U2 => TypeSig::U2,
        ET_I4 => TypeSig::I4,
        ET_U4 => TypeSig::U4,
        ET_I8 => TypeSig::I8,
        ET_U8 => TypeSig::U8,
        ET_R4 => TypeSig::R4,
        ET_R8 => TypeSig::R8,
        ET_I => TypeSig::IntPtr,
        ET_U => TypeSig::UIntPtr,
        ET_STRING => TypeSig::Str,
        ET_OBJECT => TypeSig::Object,
        ET_CLASS => TypeSig::Class(type_def_or_ref(r)?),
        ET_VALUETYPE => TypeSig::ValueType(type_def_or_ref(r)?),
        ET_SZARRAY => {
            skip_custom_mods(r)?;
            TypeSig::SzArray(Box::new(decode_type(r)?))
        }
        ET_ARRAY => {
            let element = decode_type(r)?;
            let rank = r.compressed_u32()?;
            let sizes = r.compressed_u32()?;
            for _ in 0..sizes {
                r.compressed_u32()?;
            }
            let lo_bounds = r.compressed_u32()?;
            for _ in 0..lo_bounds {
                r.compressed_i32()?;
            }
            TypeSig::Array(Box::new(element), rank)
        }
        ET_GENERICINST => {
            let definition = decode_type(r)?;
            let arg_count = r.compressed_u32()?;
            let mut args = Vec::with_capacity(arg_count as usize);
            for _ in 0..arg_count {
                args.push(decode_type(r)?);
            }
            TypeSig::GenericInst { definition: Box::new(definition), args }
        }
        ET_VAR => TypeSig::Var(r.compressed_u32()?),
        ET_MVAR => TypeSig::MVar(r.compressed_u32()?),
        ET_PTR => TypeSig::Ptr(Box::new(decode_type(r)?)),
        ET_BYREF => TypeSig::ByRef(Box::new(decode_type(r)?)),
        _ => return Err(FormatError::Unsupported("unrecognized element type in signature")),
    })
}

/// TypeDefOrRefEncoded: compressed value with a 2-bit table tag.
fn type_def_or_ref(r: &mut Reader<'_>) -> Result<SigTypeRef, FormatError> {
    let encoded = r.compressed_u32()?;
    let table = match encoded & 0x3 {
        0 => 0x02, // TypeDef
        1 => 0x01, // TypeRef
        _ => 0x1b, // TypeSpec
    };
    Ok(SigTypeRef { table, row: encoded >> 2 })
}

#[cfg(test)]
#[path = "sig_tests.rs"]
mod tests;
