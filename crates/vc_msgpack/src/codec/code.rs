//! MessagePack format bytes and header decoding shared by the readers.

use crate::error::{MessagePackError, Result};
use crate::value::ValueKind;

// -----------------------------------------------------------------------------
// Format bytes

pub const POSITIVE_FIXINT_MAX: u8 = 0x7f;
pub const FIXMAP: u8 = 0x80;
pub const FIXARRAY: u8 = 0x90;
pub const FIXSTR: u8 = 0xa0;
pub const NIL: u8 = 0xc0;
pub const NEVER_USED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;
pub const NEGATIVE_FIXINT_MIN: u8 = 0xe0;

/// Extension type code reserved for timestamps.
pub const TIMESTAMP_EXT: i8 = -1;

// -----------------------------------------------------------------------------
// Classification

/// Returns the value kind a format byte starts, or `None` for `0xc1`.
pub const fn kind_of(code: u8) -> Option<ValueKind> {
    Some(match code {
        0x00..=0x7f | 0xcc..=0xd3 | 0xe0..=0xff => ValueKind::Integer,
        0x80..=0x8f | MAP16 | MAP32 => ValueKind::Map,
        0x90..=0x9f | ARRAY16 | ARRAY32 => ValueKind::Array,
        0xa0..=0xbf | STR8 | STR16 | STR32 => ValueKind::String,
        NIL => ValueKind::Nil,
        FALSE | TRUE => ValueKind::Boolean,
        BIN8 | BIN16 | BIN32 => ValueKind::Binary,
        EXT8 | EXT16 | EXT32 | FIXEXT1..=FIXEXT16 => ValueKind::Extension,
        FLOAT32 => ValueKind::Float32,
        FLOAT64 => ValueKind::Float64,
        NEVER_USED => return None,
    })
}

/// Number of bytes following the format byte that belong to the header.
///
/// Payload bytes of strings, binaries and extensions are not included.
pub fn header_len(code: u8, offset: u64) -> Result<usize> {
    Ok(match code {
        BIN8 | UINT8 | INT8 | STR8 => 1,
        FIXEXT1..=FIXEXT16 => 1,
        EXT8 => 2,
        BIN16 | UINT16 | INT16 | STR16 | ARRAY16 | MAP16 => 2,
        EXT16 => 3,
        BIN32 | FLOAT32 | UINT32 | INT32 | STR32 | ARRAY32 | MAP32 => 4,
        EXT32 => 5,
        FLOAT64 | UINT64 | INT64 => 8,
        NEVER_USED => return Err(MessagePackError::Format { code, offset }),
        _ => 0,
    })
}

/// A decoded value header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Head {
    Nil,
    Bool(bool),
    Uint(u64),
    Int(i64),
    F32(f32),
    F64(f64),
    Str(u32),
    Bin(u32),
    Array(u32),
    Map(u32),
    Ext { type_code: i8, len: u32 },
}

impl Head {
    /// Decodes a header from its format byte and the `header_len(code)` bytes after it.
    pub fn decode(code: u8, bytes: &[u8], offset: u64) -> Result<Self> {
        let be = |n: usize| -> u64 {
            bytes[..n]
                .iter()
                .fold(0_u64, |acc, b| (acc << 8) | u64::from(*b))
        };
        Ok(match code {
            0x00..=POSITIVE_FIXINT_MAX => Self::Uint(u64::from(code)),
            0x80..=0x8f => Self::Map(u32::from(code & 0x0f)),
            0x90..=0x9f => Self::Array(u32::from(code & 0x0f)),
            0xa0..=0xbf => Self::Str(u32::from(code & 0x1f)),
            NIL => Self::Nil,
            FALSE => Self::Bool(false),
            TRUE => Self::Bool(true),
            BIN8 => Self::Bin(be(1) as u32),
            BIN16 => Self::Bin(be(2) as u32),
            BIN32 => Self::Bin(be(4) as u32),
            EXT8 => Self::Ext {
                len: be(1) as u32,
                type_code: bytes[1] as i8,
            },
            EXT16 => Self::Ext {
                len: be(2) as u32,
                type_code: bytes[2] as i8,
            },
            EXT32 => Self::Ext {
                len: be(4) as u32,
                type_code: bytes[4] as i8,
            },
            FLOAT32 => Self::F32(f32::from_bits(be(4) as u32)),
            FLOAT64 => Self::F64(f64::from_bits(be(8))),
            UINT8 => Self::Uint(be(1)),
            UINT16 => Self::Uint(be(2)),
            UINT32 => Self::Uint(be(4)),
            UINT64 => Self::Uint(be(8)),
            INT8 => Self::Int(i64::from(be(1) as u8 as i8)),
            INT16 => Self::Int(i64::from(be(2) as u16 as i16)),
            INT32 => Self::Int(i64::from(be(4) as u32 as i32)),
            INT64 => Self::Int(be(8) as i64),
            FIXEXT1..=FIXEXT16 => Self::Ext {
                len: 1 << (code - FIXEXT1),
                type_code: bytes[0] as i8,
            },
            STR8 => Self::Str(be(1) as u32),
            STR16 => Self::Str(be(2) as u32),
            STR32 => Self::Str(be(4) as u32),
            ARRAY16 => Self::Array(be(2) as u32),
            ARRAY32 => Self::Array(be(4) as u32),
            MAP16 => Self::Map(be(2) as u32),
            MAP32 => Self::Map(be(4) as u32),
            NEGATIVE_FIXINT_MIN..=0xff => Self::Int(i64::from(code as i8)),
            NEVER_USED => return Err(MessagePackError::Format { code, offset }),
        })
    }

    /// Number of payload bytes that follow the header.
    #[inline]
    pub fn payload_len(&self) -> u64 {
        match *self {
            Self::Str(len) | Self::Bin(len) | Self::Ext { len, .. } => u64::from(len),
            _ => 0,
        }
    }

    /// Number of nested values that follow the header and its payload.
    #[inline]
    pub fn children(&self) -> u64 {
        match *self {
            Self::Array(len) => u64::from(len),
            Self::Map(len) => u64::from(len) * 2,
            _ => 0,
        }
    }

    /// Arrays and maps, empty ones included.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Map(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{Head, header_len, kind_of};
    use crate::error::MessagePackError;
    use crate::value::ValueKind;

    #[test]
    fn fixed_families() {
        assert_eq!(Head::decode(0x05, &[], 0).unwrap(), Head::Uint(5));
        assert_eq!(Head::decode(0xff, &[], 0).unwrap(), Head::Int(-1));
        assert_eq!(Head::decode(0x93, &[], 0).unwrap(), Head::Array(3));
        assert_eq!(Head::decode(0x81, &[], 0).unwrap(), Head::Map(1));
        assert_eq!(Head::decode(0xa2, &[], 0).unwrap(), Head::Str(2));
    }

    #[test]
    fn sized_headers() {
        assert_eq!(header_len(0xd0, 0).unwrap(), 1);
        assert_eq!(Head::decode(0xd0, &[0x80], 0).unwrap(), Head::Int(-128));
        assert_eq!(header_len(0xc8, 0).unwrap(), 3);
        assert_eq!(
            Head::decode(0xc8, &[0x01, 0x00, 0x05], 0).unwrap(),
            Head::Ext {
                type_code: 5,
                len: 256
            }
        );
        assert_eq!(
            Head::decode(0xd8, &[0xff], 0).unwrap(),
            Head::Ext {
                type_code: -1,
                len: 16
            }
        );
    }

    #[test]
    fn never_used_byte() {
        assert!(kind_of(0xc1).is_none());
        assert_eq!(kind_of(0xdc), Some(ValueKind::Array));
        assert!(matches!(
            header_len(0xc1, 7),
            Err(MessagePackError::Format {
                code: 0xc1,
                offset: 7
            })
        ));
    }
}
