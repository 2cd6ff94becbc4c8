//! COSEM Common Data Types (Blue Book table 2, section 4.1.5).
//!
//! Only the tags the meter ingest pipeline actually encounters are
//! implemented; an unrecognized tag is a decode error rather than a
//! silently-dropped value.

use han_core::{HanError, HanResult};

use crate::cursor::Cursor;

pub const TAG_NULL: u8 = 0;
pub const TAG_ARRAY: u8 = 1;
pub const TAG_STRUCTURE: u8 = 2;
pub const TAG_DOUBLE_LONG_UNSIGNED: u8 = 6;
pub const TAG_OCTET_STRING: u8 = 9;
pub const TAG_VISIBLE_STRING: u8 = 10;
pub const TAG_INTEGER: u8 = 15;
pub const TAG_LONG: u8 = 16;
pub const TAG_LONG_UNSIGNED: u8 = 18;
pub const TAG_ENUM: u8 = 22;

/// Physical unit codes (Blue Book table 4), the subset this pipeline cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalUnit {
    Watt,
    Var,
    WattHour,
    VarHour,
    Ampere,
    Volt,
    Other(u8),
}

impl PhysicalUnit {
    pub fn from_code(code: u8) -> Self {
        match code {
            27 => Self::Watt,
            29 => Self::Var,
            30 => Self::WattHour,
            32 => Self::VarHour,
            33 => Self::Ampere,
            35 => Self::Volt,
            other => Self::Other(other),
        }
    }
}

/// A decoded COSEM value, tagged by its Common Data Type.
#[derive(Debug, Clone, PartialEq)]
pub enum CosemValue {
    Null,
    Array(Vec<CosemValue>),
    Structure(Vec<CosemValue>),
    U32(u32),
    OctetString(Vec<u8>),
    VisibleString(String),
    I8(i8),
    I16(i16),
    U16(u16),
    Enum(u8),
}

impl CosemValue {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            CosemValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            CosemValue::I16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            CosemValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    /// Any of the integral register-value tags, widened to `i64`. Used
    /// by the vendor decoders, which scale whatever integer type a
    /// register happens to carry.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CosemValue::U32(v) => Some(*v as i64),
            CosemValue::U16(v) => Some(*v as i64),
            CosemValue::I16(v) => Some(*v as i64),
            CosemValue::I8(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_visible_string(&self) -> Option<&str> {
        match self {
            CosemValue::VisibleString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_octet_string(&self) -> Option<&[u8]> {
        match self {
            CosemValue::OctetString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CosemValue]> {
        match self {
            CosemValue::Array(items) | CosemValue::Structure(items) => Some(items),
            _ => None,
        }
    }
}

/// Decode one tagged value, recursing into arrays/structures.
pub fn decode_value(cursor: &mut Cursor) -> HanResult<CosemValue> {
    let tag = cursor.u8()?;
    decode_value_with_tag(tag, cursor)
}

pub fn decode_value_with_tag(tag: u8, cursor: &mut Cursor) -> HanResult<CosemValue> {
    match tag {
        TAG_NULL => Ok(CosemValue::Null),
        TAG_ARRAY => {
            let len = cursor.u8()?;
            let items = (0..len).map(|_| decode_value(cursor)).collect::<HanResult<_>>()?;
            Ok(CosemValue::Array(items))
        }
        TAG_STRUCTURE => {
            let len = cursor.u8()?;
            let items = (0..len).map(|_| decode_value(cursor)).collect::<HanResult<_>>()?;
            Ok(CosemValue::Structure(items))
        }
        TAG_DOUBLE_LONG_UNSIGNED => Ok(CosemValue::U32(cursor.u32()?)),
        TAG_OCTET_STRING => {
            let len = cursor.u8()? as usize;
            Ok(CosemValue::OctetString(cursor.take(len)?.to_vec()))
        }
        TAG_VISIBLE_STRING => {
            let len = cursor.u8()? as usize;
            let bytes = cursor.take(len)?;
            let text = std::str::from_utf8(bytes)
                .map_err(|_| HanError::Decode("visible-string is not valid ASCII/UTF-8".into()))?
                .to_string();
            Ok(CosemValue::VisibleString(text))
        }
        TAG_INTEGER => Ok(CosemValue::I8(cursor.i8()?)),
        TAG_LONG => Ok(CosemValue::I16(cursor.i16()?)),
        TAG_LONG_UNSIGNED => Ok(CosemValue::U16(cursor.u16()?)),
        TAG_ENUM => Ok(CosemValue::Enum(cursor.u8()?)),
        other => Err(HanError::Decode(format!("unsupported common data type tag 0x{:02X}", other))),
    }
}
