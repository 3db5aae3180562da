use alloc::boxed::Box;
use alloc::format;
use core::any::Any;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::EnumSerializationMethod;
use crate::error::{MessagePackError, Result};
use crate::info::{EnumInfo, Type};
use crate::serializer::ErasedSerializer;
use crate::value::ValueKind;

pub(crate) struct EnumSerializer {
    target: Type,
    info: EnumInfo,
    method: EnumSerializationMethod,
}

impl EnumSerializer {
    pub(crate) fn new(target: Type, info: EnumInfo, method: EnumSerializationMethod) -> Result<Self> {
        for (i, variant) in info.variants().iter().enumerate() {
            if info.variants()[..i].iter().any(|v| v.name() == variant.name()) {
                return Err(MessagePackError::schema(
                    target.name(),
                    format!("variant name `{}` appears twice", variant.name()),
                ));
            }
        }
        Ok(Self {
            target,
            info,
            method,
        })
    }

    fn unknown(&self, what: impl core::fmt::Display) -> MessagePackError {
        MessagePackError::schema(self.target.name(), format!("no variant matches {what}"))
    }
}

impl ErasedSerializer for EnumSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        let raw = (self.info.value_of)(value)?;
        match self.method {
            EnumSerializationMethod::ByName => {
                let variant = self
                    .info
                    .variant_by_value(raw)
                    .ok_or_else(|| self.unknown(raw))?;
                packer.pack_str(variant.name())
            }
            EnumSerializationMethod::ByUnderlyingValue => packer.pack_i64(raw),
        }
    }

    /// Accepts both shapes, whatever the configured method.
    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        let raw = match unpacker.peek_kind()? {
            ValueKind::String => {
                let name = unpacker.read_str()?;
                self.info
                    .variant_by_name(&name)
                    .ok_or_else(|| self.unknown(format_args!("name {name:?}")))?
                    .value()
            }
            ValueKind::Integer => unpacker.read_i64()?,
            other => return Err(MessagePackError::mismatch(other.name(), self.target.name())),
        };
        (self.info.from_value)(raw).ok_or_else(|| self.unknown(raw))
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{EnumSerializationMethod, SerializationContext, SerializationOptions};
    use crate::derive::MessagePackEnum;
    use crate::error::MessagePackError;
    use crate::impl_message_pack_enum;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Level {
        Low = 1,
        High = 10,
    }
    impl_message_pack_enum!(Level { Low, High });

    #[test]
    fn by_name() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Level>().unwrap();
        let bytes = serializer.pack_single_object(&Level::High).unwrap();
        assert_eq!(bytes, [0xa4, b'H', b'i', b'g', b'h']);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), Level::High);
        // The other shape is accepted too.
        assert_eq!(serializer.unpack_single_object(&[0x01]).unwrap(), Level::Low);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, MessagePackEnum)]
    #[msgpack(crate = crate)]
    enum Tier {
        Free = 0,
        #[msgpack(rename = "pro")]
        Paid = 3,
    }

    #[test]
    fn derived_names() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Tier>().unwrap();
        assert_eq!(serializer.pack_single_object(&Tier::Free).unwrap(), [0xa4, b'F', b'r', b'e', b'e']);
        assert_eq!(serializer.pack_single_object(&Tier::Paid).unwrap(), [0xa3, b'p', b'r', b'o']);
        assert_eq!(serializer.unpack_single_object(&[0x03]).unwrap(), Tier::Paid);
        assert!(serializer.unpack_single_object(&[0xa4, b'P', b'a', b'i', b'd']).is_err());
    }

    #[test]
    fn by_underlying_value() {
        let context = SerializationContext::with_options(
            SerializationOptions::default().with_enum_method(EnumSerializationMethod::ByUnderlyingValue),
        );
        let serializer = context.get_serializer::<Level>().unwrap();
        assert_eq!(serializer.pack_single_object(&Level::High).unwrap(), [0x0a]);
        assert_eq!(
            serializer.unpack_single_object(&[0xa3, b'L', b'o', b'w']).unwrap(),
            Level::Low
        );
    }

    #[test]
    fn unknown_variants() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Level>().unwrap();
        assert!(matches!(
            serializer.unpack_single_object(&[0x05]),
            Err(MessagePackError::SchemaViolation { .. })
        ));
        assert!(matches!(
            serializer.unpack_single_object(&[0xa3, b'M', b'i', b'd']),
            Err(MessagePackError::SchemaViolation { .. })
        ));
        assert!(matches!(
            serializer.unpack_single_object(&[0xc3]),
            Err(MessagePackError::TypeMismatch { actual: "Boolean", .. })
        ));
    }
}
