//! Turns a [`TypeDescriptor`] into a serializer.
//!
//! One serializer per [`DescriptorKind`](crate::info::DescriptorKind):
//!
//! | Kind         | Wire shape                                         |
//! |--------------|----------------------------------------------------|
//! | `Primitive`  | written by the codec directly                      |
//! | `Nullable`   | nil, or the inner value                            |
//! | `Indirect`   | the inner value                                    |
//! | `Collection` | array of elements                                  |
//! | `Map`        | map of entries                                     |
//! | `Enum`       | variant name, or underlying value                  |
//! | `Composite`  | array of members by order, or map by member name   |
//! | `Abstract`   | `[discriminator, payload]`, needs a schema         |
//!
//! Nested types are requested from the [`SerializationContext`], which
//! caches them and breaks cycles. The one exception is a map member with
//! its own duplicate-key policy.

// -----------------------------------------------------------------------------
// Modules

mod collection;
mod composite;
mod enums;
mod polymorphic;
mod wrapper;

// -----------------------------------------------------------------------------
// Builder

use alloc::sync::Arc;

use crate::context::{DuplicateKeyPolicy, SerializationContext, SerializationOptions};
use crate::error::{MessagePackError, Result};
use crate::info::{MapInfo, Type, TypeDescriptor, TypeKind};
use crate::polymorphism::PolymorphismSchema;
use crate::serializer::ErasedSerializer;

pub(crate) struct SerializerBuilder<'a> {
    context: &'a SerializationContext,
    options: &'a Arc<SerializationOptions>,
}

impl<'a> SerializerBuilder<'a> {
    #[inline]
    pub(crate) fn new(context: &'a SerializationContext, options: &'a Arc<SerializationOptions>) -> Self {
        Self { context, options }
    }

    /// Builds the serializer for `descriptor`.
    ///
    /// The schema reaches trait-object slots through nullable and indirect
    /// wrappers, and their elements through `items` for collections and map
    /// values. Every other kind ignores it.
    pub(crate) fn build(
        &self,
        descriptor: &TypeDescriptor,
        schema: Option<&Arc<PolymorphismSchema>>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        let ty = *descriptor.ty();
        let items = schema.and_then(|s| s.items());
        Ok(match descriptor.info() {
            TypeKind::Primitive(info) => Arc::new(wrapper::PrimitiveSerializer::new(
                ty,
                *info,
                Arc::clone(self.options),
            )),
            TypeKind::Nullable(info) => Arc::new(wrapper::NullableSerializer::new(
                ty,
                *info,
                self.nested(info.inner, schema)?,
            )),
            TypeKind::Indirect(info) => Arc::new(wrapper::IndirectSerializer::new(
                ty,
                *info,
                self.nested(info.inner, schema)?,
            )),
            TypeKind::Collection(info) => Arc::new(collection::CollectionSerializer::new(
                ty,
                *info,
                self.nested(info.element, items)?,
            )),
            TypeKind::Map(info) => self.map(ty, info, items, info.duplicate_keys)?,
            TypeKind::Enum(info) => Arc::new(enums::EnumSerializer::new(
                ty,
                info.clone(),
                self.options.enum_method,
            )?),
            TypeKind::Composite(info) => Arc::new(composite::CompositeSerializer::new(self, ty, info)?),
            TypeKind::Abstract(info) => {
                let schema = schema.ok_or_else(|| {
                    MessagePackError::schema(ty.name(), "trait-object slot needs a polymorphism schema")
                })?;
                Arc::new(polymorphic::PolymorphicSerializer::new(self, ty, *info, schema)?)
            }
        })
    }

    fn map(
        &self,
        ty: Type,
        info: &MapInfo,
        items: Option<&Arc<PolymorphismSchema>>,
        duplicate_keys: Option<DuplicateKeyPolicy>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        Ok(Arc::new(collection::MapSerializer::new(
            ty,
            *info,
            self.nested(info.key, None)?,
            self.nested(info.value, items)?,
            duplicate_keys.unwrap_or(self.options.duplicate_keys),
        )))
    }

    /// Serializer for a composite member.
    ///
    /// A member carrying its own duplicate-key policy gets a private map
    /// serializer, reached through any `Nullable` or `Indirect` wrappers.
    /// These are not cached in the context.
    fn member(
        &self,
        descriptor: fn() -> TypeDescriptor,
        schema: Option<&Arc<PolymorphismSchema>>,
        duplicate_keys: Option<DuplicateKeyPolicy>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        let Some(policy) = duplicate_keys else {
            return self.nested(descriptor, schema);
        };
        let descriptor = descriptor();
        let ty = *descriptor.ty();
        Ok(match descriptor.info() {
            TypeKind::Nullable(info) => Arc::new(wrapper::NullableSerializer::new(
                ty,
                *info,
                self.member(info.inner, schema, duplicate_keys)?,
            )),
            TypeKind::Indirect(info) => Arc::new(wrapper::IndirectSerializer::new(
                ty,
                *info,
                self.member(info.inner, schema, duplicate_keys)?,
            )),
            TypeKind::Map(info) => self.map(ty, info, schema.and_then(|s| s.items()), Some(policy))?,
            _ => {
                return Err(MessagePackError::schema(
                    ty.name(),
                    "a duplicate-key policy needs a map member",
                ));
            }
        })
    }

    /// Requests a nested serializer from the context.
    fn nested(
        &self,
        descriptor: fn() -> TypeDescriptor,
        schema: Option<&Arc<PolymorphismSchema>>,
    ) -> Result<Arc<dyn ErasedSerializer>> {
        let ty = *descriptor().ty();
        self.context.resolve(ty, descriptor, schema)
    }

    #[inline]
    fn options(&self) -> &SerializationOptions {
        self.options
    }
}
