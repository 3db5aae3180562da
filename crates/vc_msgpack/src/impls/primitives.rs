use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::SerializationOptions;
use crate::error::{MessagePackError, Result};
use crate::info::{MessagePackType, PackPrimitive, TypeDescriptor};
use crate::value::Value;

// Implements `MessagePackType` for a type that already implements `PackPrimitive`.
macro_rules! impl_primitive_type {
    ($($ty:ty),* $(,)?) => {$(
        impl MessagePackType for $ty {
            #[inline]
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::primitive::<Self>()
            }
        }
    )*};
}

macro_rules! impl_integer {
    ($($ty:ty => $pack:ident),* $(,)?) => {$(
        impl PackPrimitive for $ty {
            #[inline]
            fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
                packer.$pack(*self)
            }

            #[inline]
            fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
                unpacker.read_int::<$ty>()
            }
        }

        impl_primitive_type!($ty);
    )*};
}

impl_integer! {
    u8 => pack_u8,
    u16 => pack_u16,
    u32 => pack_u32,
    u64 => pack_u64,
    i8 => pack_i8,
    i16 => pack_i16,
    i32 => pack_i32,
    i64 => pack_i64,
}

impl PackPrimitive for usize {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_u64(*self as u64)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_int::<usize>()
    }
}

impl PackPrimitive for isize {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_i64(*self as i64)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_int::<isize>()
    }
}

impl PackPrimitive for () {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_nil()
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_nil()
    }
}

impl PackPrimitive for bool {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_bool(*self)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_bool()
    }
}

impl PackPrimitive for f32 {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_f32(*self)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_f32()
    }
}

impl PackPrimitive for f64 {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_f64(*self)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_f64()
    }
}

/// Written as its scalar value.
impl PackPrimitive for char {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_u32(u32::from(*self))
    }

    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        let scalar = unpacker.read_int::<u32>()?;
        char::from_u32(scalar).ok_or_else(|| {
            MessagePackError::schema("char", alloc::format!("{scalar:#x} is not a Unicode scalar value"))
        })
    }
}

impl PackPrimitive for String {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_str(self)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_str()
    }
}

/// Byte buffers are binary, not arrays of integers.
impl PackPrimitive for Vec<u8> {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_bin(self)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_bin()
    }
}

impl PackPrimitive for Value {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_value(self)
    }

    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        let offset = unpacker.position();
        unpacker
            .read_value()?
            .ok_or(MessagePackError::UnexpectedEndOfStream { offset })
    }
}

impl_primitive_type!(usize, isize, (), bool, f32, f64, char, String, Value);

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::codec::PackerCompatibilityOptions;
    use crate::context::{SerializationContext, SerializationOptions};
    use crate::error::MessagePackError;
    use crate::value::Value;

    #[test]
    fn integers_use_minimal_width() {
        let context = SerializationContext::new();
        let s = context.get_serializer::<i64>().unwrap();
        assert_eq!(s.pack_single_object(&127).unwrap(), [0x7f]);
        assert_eq!(s.pack_single_object(&-32).unwrap(), [0xe0]);
        assert_eq!(s.pack_single_object(&200).unwrap(), [0xcc, 0xc8]);
        assert_eq!(s.pack_single_object(&-129).unwrap(), [0xd1, 0xff, 0x7f]);

        let s = context.get_serializer::<usize>().unwrap();
        assert_eq!(s.pack_single_object(&65_536).unwrap(), [0xce, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(s.unpack_single_object(&[0xcd, 0x01, 0x00]).unwrap(), 256);
    }

    #[test]
    fn integer_range_is_checked() {
        let context = SerializationContext::new();
        let s = context.get_serializer::<u8>().unwrap();
        assert!(matches!(
            s.unpack_single_object(&[0xcd, 0x01, 0x00]),
            Err(MessagePackError::TypeMismatch { .. })
        ));
        assert!(s.unpack_single_object(&[0xff]).is_err());
    }

    #[test]
    fn floats_and_chars() {
        let context = SerializationContext::new();
        let s = context.get_serializer::<f32>().unwrap();
        assert_eq!(s.pack_single_object(&1.5).unwrap(), [0xca, 0x3f, 0xc0, 0x00, 0x00]);

        let s = context.get_serializer::<char>().unwrap();
        assert_eq!(s.pack_single_object(&'A').unwrap(), [0x41]);
        assert_eq!(s.unpack_single_object(&[0xcd, 0x00, 0xe9]).unwrap(), 'é');
        assert!(s.unpack_single_object(&[0xcd, 0xd8, 0x00]).is_err());
    }

    #[test]
    fn bytes_and_strings() {
        let context = SerializationContext::new();
        let bytes = context.get_serializer::<Vec<u8>>().unwrap();
        assert_eq!(bytes.pack_single_object(&vec![1, 2]).unwrap(), [0xc4, 0x02, 0x01, 0x02]);

        let text = context.get_serializer::<String>().unwrap();
        let long = "x".repeat(40);
        assert_eq!(text.pack_single_object(&long).unwrap()[..2], [0xd9, 40]);
        assert!(matches!(
            text.unpack_single_object(&[0xa2, 0xc3, 0x28]),
            Err(MessagePackError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn binary_as_raw() {
        let context = SerializationContext::with_options(
            SerializationOptions::default().with_compatibility(PackerCompatibilityOptions::PACK_BINARY_AS_RAW),
        );
        let bytes = context.get_serializer::<Vec<u8>>().unwrap();
        let packed = bytes.pack_single_object(&vec![7; 3]).unwrap();
        assert_eq!(packed, [0xa3, 7, 7, 7]);
        assert_eq!(bytes.unpack_single_object(&packed).unwrap(), vec![7; 3]);

        let text = context.get_serializer::<String>().unwrap();
        assert_eq!(text.pack_single_object(&"x".repeat(40)).unwrap()[..3], [0xda, 0x00, 40]);
    }

    #[test]
    fn dynamic_values() {
        let context = SerializationContext::new();
        let s = context.get_serializer::<Value>().unwrap();
        let value = Value::Array(vec![Value::from(1_u8), Value::Nil, Value::from("a")]);
        let bytes = s.pack_single_object(&value).unwrap();
        assert_eq!(bytes, [0x93, 0x01, 0xc0, 0xa1, b'a']);
        assert_eq!(s.unpack_single_object(&bytes).unwrap(), value);
        assert!(matches!(
            s.unpack_single_object(&[]),
            Err(MessagePackError::UnexpectedEndOfStream { offset: 0 })
        ));
    }
}
