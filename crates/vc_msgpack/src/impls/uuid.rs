use ::uuid::Uuid;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::SerializationOptions;
use crate::error::{MessagePackError, Result};
use crate::info::{MessagePackType, PackPrimitive, TypeDescriptor};

/// Sixteen bytes of binary, in RFC 4122 byte order.
impl PackPrimitive for Uuid {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_bin(self.as_bytes())
    }

    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        let bytes = unpacker.read_bin()?;
        Uuid::from_slice(&bytes).map_err(|e| MessagePackError::schema("Uuid", alloc::format!("{e}")))
    }
}

impl MessagePackType for Uuid {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use ::uuid::Uuid;

    use crate::context::SerializationContext;
    use crate::error::MessagePackError;

    #[test]
    fn sixteen_bytes() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Uuid>().unwrap();
        let id = Uuid::new_v4();
        let bytes = serializer.pack_single_object(&id).unwrap();
        assert_eq!(bytes[..2], [0xc4, 0x10]);
        assert_eq!(&bytes[2..], id.as_bytes());
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), id);

        assert!(matches!(
            serializer.unpack_single_object(&[0xc4, 0x02, 0x00, 0x01]),
            Err(MessagePackError::SchemaViolation { .. })
        ));
    }
}
