use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::SerializationOptions;
use crate::error::Result;
use crate::info::{IndirectInfo, NullableInfo, PrimitiveInfo, Type};
use crate::serializer::ErasedSerializer;

// -----------------------------------------------------------------------------
// Primitive

pub(crate) struct PrimitiveSerializer {
    target: Type,
    info: PrimitiveInfo,
    options: Arc<SerializationOptions>,
}

impl PrimitiveSerializer {
    pub(crate) fn new(target: Type, info: PrimitiveInfo, options: Arc<SerializationOptions>) -> Self {
        Self {
            target,
            info,
            options,
        }
    }
}

impl ErasedSerializer for PrimitiveSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    #[inline]
    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        (self.info.pack)(value, packer, &self.options)
    }

    #[inline]
    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        (self.info.unpack)(unpacker, &self.options)
    }
}

// -----------------------------------------------------------------------------
// Nullable

pub(crate) struct NullableSerializer {
    target: Type,
    info: NullableInfo,
    inner: Arc<dyn ErasedSerializer>,
}

impl NullableSerializer {
    pub(crate) fn new(target: Type, info: NullableInfo, inner: Arc<dyn ErasedSerializer>) -> Self {
        Self {
            target,
            info,
            inner,
        }
    }
}

impl ErasedSerializer for NullableSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        match (self.info.get)(value)? {
            Some(inner) => self.inner.pack_erased(packer, inner),
            None => packer.pack_nil(),
        }
    }

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        if unpacker.is_nil()? {
            unpacker.read_nil()?;
            return Ok((self.info.none)());
        }
        (self.info.some)(self.inner.unpack_erased(unpacker)?)
    }
}

// -----------------------------------------------------------------------------
// Indirect

pub(crate) struct IndirectSerializer {
    target: Type,
    info: IndirectInfo,
    inner: Arc<dyn ErasedSerializer>,
}

impl IndirectSerializer {
    pub(crate) fn new(target: Type, info: IndirectInfo, inner: Arc<dyn ErasedSerializer>) -> Self {
        Self {
            target,
            info,
            inner,
        }
    }
}

impl ErasedSerializer for IndirectSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    #[inline]
    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        self.inner.pack_erased(packer, (self.info.get)(value)?)
    }

    #[inline]
    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        (self.info.wrap)(self.inner.unpack_erased(unpacker)?)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use crate::context::SerializationContext;
    use crate::error::MessagePackError;

    #[test]
    fn nullable() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Option<String>>().unwrap();

        assert_eq!(serializer.pack_single_object(&None).unwrap(), [0xc0]);
        assert_eq!(serializer.unpack_single_object(&[0xc0]).unwrap(), None);
        assert_eq!(
            serializer.unpack_single_object(&[0xa2, b'h', b'i']).unwrap(),
            Some(String::from("hi"))
        );
    }

    #[test]
    fn nested_nullable_collapses_on_wire() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Option<Option<u8>>>().unwrap();
        assert_eq!(serializer.pack_single_object(&Some(None)).unwrap(), [0xc0]);
        assert_eq!(serializer.unpack_single_object(&[0xc0]).unwrap(), None);
    }

    #[test]
    fn indirect_is_transparent() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Box<i16>>().unwrap();
        let bytes = serializer.pack_single_object(&Box::new(-300)).unwrap();
        assert_eq!(bytes, [0xd1, 0xfe, 0xd4]);
        assert_eq!(*serializer.unpack_single_object(&bytes).unwrap(), -300);
    }

    #[test]
    fn nil_for_non_nullable() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<String>().unwrap();
        assert!(matches!(
            serializer.unpack_single_object(&[0xc0]),
            Err(MessagePackError::TypeMismatch { actual: "Nil", .. })
        ));
    }
}
