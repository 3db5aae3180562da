use std::time::SystemTime;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::{DateTimeConversionMethod, SerializationOptions};
use crate::error::{MessagePackError, Result};
use crate::info::{MessagePackType, PackPrimitive, TypeDescriptor};
use crate::value::{Timestamp, ValueKind};

impl PackPrimitive for Timestamp {
    #[inline]
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, _: &SerializationOptions) -> Result<()> {
        packer.pack_timestamp(*self)
    }

    #[inline]
    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        unpacker.read_timestamp()
    }
}

impl MessagePackType for Timestamp {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>()
    }
}

/// Follows [`DateTimeConversionMethod`] when packing.
///
/// Unpacking accepts either shape, so a reader does not need to know how
/// the writer was configured.
impl PackPrimitive for SystemTime {
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, options: &SerializationOptions) -> Result<()> {
        let timestamp = Timestamp::from_system_time(*self);
        match options.date_time_conversion {
            DateTimeConversionMethod::Native => packer.pack_timestamp(timestamp),
            DateTimeConversionMethod::UnixEpoch => packer.pack_i64(timestamp.unix_millis()),
        }
    }

    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, _: &SerializationOptions) -> Result<Self> {
        let timestamp = match unpacker.peek_kind()? {
            ValueKind::Extension => unpacker.read_timestamp()?,
            ValueKind::Integer => Timestamp::from_unix_millis(unpacker.read_i64()?),
            other => return Err(MessagePackError::mismatch(other.name(), "SystemTime")),
        };
        timestamp.to_system_time().ok_or_else(|| {
            MessagePackError::schema("SystemTime", "timestamp is out of the platform's range")
        })
    }
}

impl MessagePackType for SystemTime {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::context::{DateTimeConversionMethod, SerializationContext, SerializationOptions};
    use crate::error::MessagePackError;
    use crate::value::Timestamp;

    #[test]
    fn timestamp_uses_narrowest_layout() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Timestamp>().unwrap();
        let bytes = serializer.pack_single_object(&Timestamp::from_seconds(2)).unwrap();
        assert_eq!(bytes, [0xd6, 0xff, 0x00, 0x00, 0x00, 0x02]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), Timestamp::from_seconds(2));
    }

    #[test]
    fn system_time_native() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<SystemTime>().unwrap();
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let bytes = serializer.pack_single_object(&time).unwrap();
        assert_eq!(bytes[..2], [0xd7, 0xff]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), time);

        let before = UNIX_EPOCH - Duration::from_millis(1500);
        let bytes = serializer.pack_single_object(&before).unwrap();
        assert_eq!(bytes[..3], [0xc7, 0x0c, 0xff]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), before);
    }

    #[test]
    fn system_time_unix_epoch() {
        let context = SerializationContext::with_options(
            SerializationOptions::default().with_date_time_conversion(DateTimeConversionMethod::UnixEpoch),
        );
        let serializer = context.get_serializer::<SystemTime>().unwrap();
        let time = UNIX_EPOCH + Duration::from_millis(1500);
        let bytes = serializer.pack_single_object(&time).unwrap();
        assert_eq!(bytes, [0xcd, 0x05, 0xdc]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), time);

        // A native timestamp is still understood.
        let bytes = [0xd6, 0xff, 0x00, 0x00, 0x00, 0x02];
        assert_eq!(
            serializer.unpack_single_object(&bytes).unwrap(),
            UNIX_EPOCH + Duration::from_secs(2)
        );
        assert!(matches!(
            serializer.unpack_single_object(&[0xa1, b'x']),
            Err(MessagePackError::TypeMismatch { actual: "String", .. })
        ));
    }
}
