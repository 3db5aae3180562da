use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use core::any::Any;

use vc_utils::TypeIdMap;

use crate::builder::SerializerBuilder;
use crate::codec::{DynPacker, DynUnpacker};
use crate::error::{MessagePackError, Result};
use crate::info::{AbstractInfo, Type};
use crate::polymorphism::{Discriminator, PolymorphicType, PolymorphismSchema};
use crate::serializer::ErasedSerializer;
use crate::value::ValueKind;

/// Writes a trait-object slot as `[discriminator, payload]`.
pub(crate) struct PolymorphicSerializer {
    target: Type,
    info: AbstractInfo,
    schema: Arc<PolymorphismSchema>,
    // Payload serializers by concrete type.
    payloads: TypeIdMap<Arc<dyn ErasedSerializer>>,
}

impl PolymorphicSerializer {
    pub(crate) fn new(
        builder: &SerializerBuilder<'_>,
        target: Type,
        info: AbstractInfo,
        schema: &Arc<PolymorphismSchema>,
    ) -> Result<Self> {
        schema.validate(&target)?;
        let mut payloads = TypeIdMap::new();
        for entry in schema.entries() {
            payloads.insert(entry.ty().id(), builder.nested(entry.descriptor, None)?);
        }
        Ok(Self {
            target,
            info,
            schema: Arc::clone(schema),
            payloads,
        })
    }

    fn payload(&self, entry: &PolymorphicType) -> Result<&Arc<dyn ErasedSerializer>> {
        self.payloads.get(&entry.ty().id()).ok_or_else(|| {
            MessagePackError::schema(self.target.name(), format!("no payload serializer for {:?}", entry.ty()))
        })
    }
}

impl ErasedSerializer for PolymorphicSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        let concrete = (self.info.as_any)(value)?;
        let entry = self.schema.find_by_type(Any::type_id(concrete)).ok_or_else(|| {
            MessagePackError::schema(
                self.target.name(),
                "runtime type is not registered in the polymorphism schema",
            )
        })?;
        let payload = self.payload(entry)?;

        packer.pack_array_header(2)?;
        match entry.discriminator() {
            Discriminator::Int(v) => packer.pack_i64(*v)?,
            Discriminator::Str(v) => packer.pack_str(v)?,
        }
        payload.pack_erased(packer, concrete)
    }

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        let len = unpacker.read_array_header()?;
        if len != 2 {
            return Err(MessagePackError::schema(
                self.target.name(),
                format!("expected [discriminator, payload], found {len} items"),
            ));
        }

        let discriminator = match unpacker.peek_kind()? {
            ValueKind::Integer => Discriminator::Int(unpacker.read_i64()?),
            ValueKind::String => Discriminator::Str(unpacker.read_str()?),
            other => return Err(MessagePackError::mismatch(other.name(), "Discriminator")),
        };
        let entry = self.schema.find_by_discriminator(&discriminator).ok_or_else(|| {
            MessagePackError::schema(self.target.name(), format!("unknown discriminator {discriminator}"))
        })?;

        (entry.into_slot)(self.payload(entry)?.unpack_erased(unpacker)?)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;

    use crate::context::SerializationContext;
    use crate::error::MessagePackError;
    use crate::polymorphism::PolymorphismSchema;
    use crate::{impl_message_pack_abstract, impl_message_pack_object};

    trait Shape: Any {
        fn area(&self) -> f64;
    }
    impl_message_pack_abstract!(Shape);

    #[derive(Default, Debug, PartialEq)]
    struct Square {
        side: f64,
    }
    impl Shape for Square {
        fn area(&self) -> f64 {
            self.side * self.side
        }
    }
    impl_message_pack_object!(Square { side: f64 });

    #[derive(Default, Debug, PartialEq)]
    struct Label {
        text: String,
    }
    impl Shape for Label {
        fn area(&self) -> f64 {
            0.0
        }
    }
    impl_message_pack_object!(Label { text: String });

    #[derive(Default)]
    struct Unlisted;
    impl Shape for Unlisted {
        fn area(&self) -> f64 {
            1.0
        }
    }
    impl_message_pack_object!(Unlisted {});

    fn schema() -> Arc<PolymorphismSchema> {
        Arc::new(
            PolymorphismSchema::builder::<Box<dyn Shape>>()
                .register::<Square>(1)
                .register::<Label>("label")
                .build(),
        )
    }

    #[derive(Default)]
    struct Drawing {
        title: String,
        shapes: Vec<Box<dyn Shape>>,
        named: BTreeMap<String, Box<dyn Shape>>,
    }
    impl_message_pack_object!(Drawing {
        title: String = 0,
        #[schema(PolymorphismSchema::for_items(schema()))]
        shapes: Vec<Box<dyn Shape>> = 1,
        #[schema(PolymorphismSchema::for_items(schema()))]
        named: BTreeMap<String, Box<dyn Shape>> = 2,
    });

    fn concrete<T: 'static>(shape: &dyn Shape) -> &T {
        (shape as &dyn Any).downcast_ref::<T>().unwrap()
    }

    #[test]
    fn round_trip() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer_with_schema::<Box<dyn Shape>>(schema()).unwrap();

        let square: Box<dyn Shape> = Box::new(Square { side: 2.0 });
        let bytes = serializer.pack_single_object(&square).unwrap();
        assert_eq!(&bytes[..3], [0x92, 0x01, 0x91]);
        let back = serializer.unpack_single_object(&bytes).unwrap();
        assert_eq!(back.area(), 4.0);

        let label: Box<dyn Shape> = Box::new(Label { text: "x".into() });
        let bytes = serializer.pack_single_object(&label).unwrap();
        assert_eq!(bytes, [0x92, 0xa5, b'l', b'a', b'b', b'e', b'l', 0x91, 0xa1, b'x']);
        let back = serializer.unpack_single_object(&bytes).unwrap();
        assert_eq!(concrete::<Label>(&*back).text, "x");
    }

    #[test]
    fn unregistered_runtime_type() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer_with_schema::<Box<dyn Shape>>(schema()).unwrap();
        let shape: Box<dyn Shape> = Box::new(Unlisted);
        assert!(matches!(
            serializer.pack_single_object(&shape),
            Err(MessagePackError::SchemaViolation { .. })
        ));
        assert!(matches!(
            serializer.unpack_single_object(&[0x92, 0x07, 0x90]),
            Err(MessagePackError::SchemaViolation { .. })
        ));
    }

    trait Outline: Any {}
    impl_message_pack_abstract!(Outline);
    impl Outline for Square {}

    #[test]
    fn schema_must_match_the_slot() {
        let context = SerializationContext::new();
        let outlines = PolymorphismSchema::builder::<Box<dyn Outline>>()
            .register::<Square>(1)
            .build();
        let Err(MessagePackError::SchemaViolation { reason, .. }) =
            context.get_serializer_with_schema::<Box<dyn Shape>>(outlines)
        else {
            panic!("a schema for another slot type must be refused");
        };
        assert!(reason.contains("Outline"));
    }

    #[test]
    fn schema_is_required() {
        let context = SerializationContext::new();
        assert!(matches!(
            context.get_serializer::<Box<dyn Shape>>(),
            Err(MessagePackError::SchemaViolation { .. })
        ));
        assert!(context.get_serializer::<Vec<Box<dyn Shape>>>().is_err());
    }

    #[test]
    fn equal_schemas_share_a_serializer() {
        let context = SerializationContext::new();
        let a = context.get_serializer_with_schema::<Box<dyn Shape>>(schema()).unwrap();
        let b = context.get_serializer_with_schema::<Box<dyn Shape>>(schema()).unwrap();
        assert!(Arc::ptr_eq(a.erased(), b.erased()));
    }

    #[test]
    fn schema_reaches_collection_elements() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Drawing>().unwrap();

        let mut named: BTreeMap<String, Box<dyn Shape>> = BTreeMap::new();
        named.insert("tag".into(), Box::new(Label { text: "hi".into() }));
        let drawing = Drawing {
            title: "d".into(),
            shapes: vec![Box::new(Square { side: 3.0 }), Box::new(Label::default())],
            named,
        };

        let bytes = serializer.pack_single_object(&drawing).unwrap();
        let back = serializer.unpack_single_object(&bytes).unwrap();
        assert_eq!(back.title, "d");
        assert_eq!(back.shapes.len(), 2);
        assert_eq!(concrete::<Square>(&*back.shapes[0]).side, 3.0);
        assert_eq!(concrete::<Label>(&*back.shapes[1]).text, "");
        assert_eq!(concrete::<Label>(&*back.named["tag"]).text, "hi");
    }
}
