use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::codec::code::TIMESTAMP_EXT;
use crate::error::{MessagePackError, Result};
use crate::value::{Integer, Timestamp, ValueKind};

// -----------------------------------------------------------------------------
// ExtensionValue

/// An application-defined extension: a type code and opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionValue {
    pub type_code: i8,
    pub data: Vec<u8>,
}

impl ExtensionValue {
    #[inline]
    pub fn new(type_code: i8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            type_code,
            data: data.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// Value

/// Any decoded MessagePack value.
///
/// Used where the static type of incoming data is unknown. Maps keep the
/// order they had on the wire and may hold the same key twice.
///
/// # Equality
///
/// Integers compare by numeric value regardless of wire width. An integer
/// never equals a float, even `1 == 1.0`. `Float32` and `Float64` compare
/// numerically, and `NaN` equals nothing.
///
/// # Examples
///
/// ```
/// use vc_msgpack::value::Value;
///
/// let value = Value::Map(vec![(Value::from("id"), Value::from(7_u8))]);
///
/// assert!(value.is_map());
/// assert_eq!(value.get("id").unwrap().as_i32().unwrap(), 7);
/// assert_ne!(Value::from(1_i64), Value::from(1.0_f64));
///
/// let err = Value::from(true).as_str().unwrap_err();
/// assert_eq!(err.to_string(), "Do not convert Boolean to String");
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(Integer),
    Float32(f32),
    Float64(f64),
    /// UTF-8 bytes; not validated until read through [`Value::as_str`].
    String(Vec<u8>),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Extension(ExtensionValue),
}

macro_rules! impl_is_method {
    ($name:ident : $kind:ident) => {
        #[inline]
        pub const fn $name(&self) -> bool {
            matches!(self, Self::$kind(..))
        }
    };
}

macro_rules! impl_int_accessor {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            /// Returns the integer if it fits the target type.
            pub fn $name(&self) -> Result<$ty> {
                match self {
                    Self::Integer(v) => v
                        .cast::<$ty>()
                        .ok_or(MessagePackError::mismatch("Integer", stringify!($ty))),
                    _ => Err(self.mismatch(stringify!($ty))),
                }
            }
        )*
    };
}

impl Value {
    impl_is_method!(is_map: Map);
    impl_is_method!(is_list: Array);
    impl_is_method!(is_string: String);
    impl_is_method!(is_binary: Binary);
    impl_is_method!(is_extension: Extension);

    impl_int_accessor!(
        as_i8 => i8, as_i16 => i16, as_i32 => i32, as_i64 => i64,
        as_u8 => u8, as_u16 => u16, as_u32 => u32, as_u64 => u64,
    );

    #[inline]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the tag of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Nil => ValueKind::Nil,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float32(_) => ValueKind::Float32,
            Self::Float64(_) => ValueKind::Float64,
            Self::String(_) => ValueKind::String,
            Self::Binary(_) => ValueKind::Binary,
            Self::Array(_) => ValueKind::Array,
            Self::Map(_) => ValueKind::Map,
            Self::Extension(_) => ValueKind::Extension,
        }
    }

    #[inline]
    fn mismatch(&self, expected: &'static str) -> MessagePackError {
        MessagePackError::mismatch(self.kind().name(), expected)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(v) => Ok(*v),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Returns a float, widening `Float32` and converting integers.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Self::Float64(v) => Ok(*v),
            Self::Float32(v) => Ok(f64::from(*v)),
            Self::Integer(v) => Ok(v.as_f64()),
            _ => Err(self.mismatch("f64")),
        }
    }

    /// Returns a float, narrowing `Float64` and converting integers.
    pub fn as_f32(&self) -> Result<f32> {
        match self {
            Self::Float32(v) => Ok(*v),
            Self::Float64(v) => Ok(*v as f32),
            Self::Integer(v) => Ok(v.as_f64() as f32),
            _ => Err(self.mismatch("f32")),
        }
    }

    /// Returns the string contents; fails on non-strings and invalid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::String(bytes) => {
                core::str::from_utf8(bytes).map_err(|_| MessagePackError::mismatch("Binary", "String"))
            }
            _ => Err(self.mismatch("String")),
        }
    }

    /// Returns the raw bytes of a binary or a string.
    ///
    /// Strings are accepted because legacy writers send binaries as raw strings.
    pub fn as_binary(&self) -> Result<&[u8]> {
        match self {
            Self::Binary(bytes) | Self::String(bytes) => Ok(bytes),
            _ => Err(self.mismatch("Binary")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Self::Array(items) => Ok(items),
            _ => Err(self.mismatch("Array")),
        }
    }

    pub fn as_map(&self) -> Result<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Ok(entries),
            _ => Err(self.mismatch("Map")),
        }
    }

    pub fn as_extension(&self) -> Result<&ExtensionValue> {
        match self {
            Self::Extension(ext) => Ok(ext),
            _ => Err(self.mismatch("Extension")),
        }
    }

    /// Decodes a timestamp extension (type `-1`).
    pub fn as_timestamp(&self) -> Result<Timestamp> {
        match self {
            Self::Extension(ext) if ext.type_code == TIMESTAMP_EXT => {
                Timestamp::decode(&ext.data).ok_or(MessagePackError::mismatch("Extension", "Timestamp"))
            }
            _ => Err(self.mismatch("Timestamp")),
        }
    }

    /// Looks up the first entry of a map whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::String(bytes) if bytes == key.as_bytes()))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Equality

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float32(a), Self::Float32(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Float32(a), Self::Float64(b)) | (Self::Float64(b), Self::Float32(a)) => {
                f64::from(*a) == *b
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Extension(a), Self::Extension(b)) => a == b,
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Integer(Integer::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl From<Integer> for Value {
    #[inline]
    fn from(value: Integer) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(value: f32) -> Self {
        Self::Float32(value)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value.into_bytes())
    }
}

impl From<&[u8]> for Value {
    #[inline]
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<ExtensionValue> for Value {
    #[inline]
    fn from(value: ExtensionValue) -> Self {
        Self::Extension(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        let mut buf = [0_u8; 12];
        Self::Extension(ExtensionValue::new(TIMESTAMP_EXT, value.encode(&mut buf)))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

// -----------------------------------------------------------------------------
// Display

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Self::Binary(bytes) => write_hex(f, bytes),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Extension(ext) => {
                write!(f, "ext({}, ", ext.type_code)?;
                write_hex(f, &ext.data)?;
                f.write_str(")")
            }
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    bytes.iter().try_for_each(|b| write!(f, "{b:02x}"))
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::{ExtensionValue, Value};
    use crate::error::MessagePackError;
    use crate::value::Timestamp;

    #[test]
    fn integer_equality_ignores_width() {
        assert_eq!(Value::from(1_u8), Value::from(1_i64));
        assert_eq!(Value::from(-5_i8), Value::from(-5_i64));
        assert_ne!(Value::from(1_i32), Value::from(1.0_f32));
        assert_eq!(Value::from(0.5_f32), Value::from(0.5_f64));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn range_checked_accessors() {
        assert_eq!(Value::from(200_u8).as_u8().unwrap(), 200);
        assert!(matches!(
            Value::from(200_u8).as_i8(),
            Err(MessagePackError::TypeMismatch {
                actual: "Integer",
                expected: "i8"
            })
        ));
        assert_eq!(Value::from(-1_i8).as_i64().unwrap(), -1);
        assert!(Value::from(-1_i8).as_u64().is_err());
        assert_eq!(Value::from(3_u8).as_f64().unwrap(), 3.0);
    }

    #[test]
    fn extension_is_not_binary() {
        let ext = Value::from(ExtensionValue::new(1, vec![1, 2]));
        let err = ext.as_binary().unwrap_err();
        assert_eq!(err.to_string(), "Do not convert Extension to Binary");
        assert!(ext.as_str().is_err());
        assert_eq!(ext.as_extension().unwrap().data, [1, 2]);
    }

    #[test]
    fn raw_string_reads_as_binary() {
        assert_eq!(Value::from("ab").as_binary().unwrap(), b"ab");
        assert!(Value::from(vec![0xff_u8]).as_str().is_err());
    }

    #[test]
    fn timestamp_accessor() {
        let ts = Timestamp::new(10, 20).unwrap();
        assert_eq!(Value::from(ts).as_timestamp().unwrap(), ts);
        assert!(Value::from(ExtensionValue::new(2, vec![0; 4])).as_timestamp().is_err());
    }

    #[test]
    fn display() {
        let value = Value::Map(vec![
            (Value::from("k"), Value::Array(vec![Value::Nil, Value::from(-2_i8)])),
            (Value::from(1_u8), Value::from(vec![0xab_u8])),
        ]);
        assert_eq!(value.to_string(), r#"{"k": [nil, -2], 1: 0xab}"#);
    }
}
