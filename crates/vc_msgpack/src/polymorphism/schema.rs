use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;

use crate::error::{MessagePackError, Result};
use crate::info::{MessagePackType, Type, TypeDescriptor, unbox};
use crate::polymorphism::Discriminator;

// -----------------------------------------------------------------------------
// PolymorphicSlot

/// A slot type `Self` that can hold a concrete `C`.
///
/// Implemented for `Box<dyn Trait>` by [`impl_message_pack_abstract!`] for
/// every `C: Trait`.
///
/// [`impl_message_pack_abstract!`]: crate::impl_message_pack_abstract
pub trait PolymorphicSlot<C>: MessagePackType {
    fn from_concrete(concrete: C) -> Self;
}

// -----------------------------------------------------------------------------
// PolymorphicType

/// One concrete type a slot may hold, and the tag that identifies it.
#[derive(Clone)]
pub struct PolymorphicType {
    pub(crate) discriminator: Discriminator,
    pub(crate) ty: Type,
    pub(crate) descriptor: fn() -> TypeDescriptor,
    pub(crate) into_slot: fn(Box<dyn Any>) -> Result<Box<dyn Any>>,
}

impl PolymorphicType {
    #[inline]
    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    /// The concrete type.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

impl fmt::Debug for PolymorphicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {:?}", self.discriminator, self.ty)
    }
}

// -----------------------------------------------------------------------------
// SchemaKey

/// Content identity of a schema, used to key the serializer cache.
///
/// Two schemas registering the same tags for the same types share a key,
/// and therefore share serializers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    slot: Option<TypeId>,
    entries: Vec<(Discriminator, TypeId)>,
    items: Option<Box<SchemaKey>>,
}

// -----------------------------------------------------------------------------
// PolymorphismSchema

/// Maps the concrete types a trait-object slot may hold to discriminators.
///
/// A slot with a schema is written as a two-element array
/// `[discriminator, payload]`. The schema of a collection of slots goes in
/// [`items`](Self::items), and applies to each element (or to each value of
/// a map).
///
/// Uniqueness of discriminators and of concrete types is checked when a
/// serializer is built from the schema.
///
/// # Examples
///
/// ```
/// use vc_msgpack::polymorphism::{Discriminator, PolymorphismSchema};
/// use vc_msgpack::{impl_message_pack_abstract, impl_message_pack_object};
///
/// trait Shape: core::any::Any {}
/// impl_message_pack_abstract!(Shape);
///
/// #[derive(Default)]
/// struct Circle { radius: f64 }
/// impl Shape for Circle {}
/// impl_message_pack_object!(Circle { radius: f64 });
///
/// let schema = PolymorphismSchema::builder::<Box<dyn Shape>>()
///     .register::<Circle>("circle")
///     .build();
///
/// assert_eq!(schema.entries()[0].discriminator(), &Discriminator::from("circle"));
///
/// let list_schema = PolymorphismSchema::for_items(schema);
/// assert!(list_schema.entries().is_empty());
/// assert!(list_schema.items().is_some());
/// ```
#[derive(Clone)]
pub struct PolymorphismSchema {
    slot: Option<Type>,
    entries: Vec<PolymorphicType>,
    items: Option<Arc<PolymorphismSchema>>,
    key: SchemaKey,
}

impl PolymorphismSchema {
    /// Starts a schema for slots of type `A`.
    #[inline]
    pub fn builder<A: MessagePackType>() -> SchemaBuilder<A> {
        SchemaBuilder {
            slot: Type::of::<A>(),
            entries: Vec::new(),
            items: None,
            _marker: PhantomData,
        }
    }

    /// A schema that only applies to the elements of a collection.
    pub fn for_items(items: impl Into<Arc<PolymorphismSchema>>) -> Self {
        Self::from_parts(None, Vec::new(), Some(items.into()))
    }

    fn from_parts(
        slot: Option<Type>,
        entries: Vec<PolymorphicType>,
        items: Option<Arc<PolymorphismSchema>>,
    ) -> Self {
        let key = SchemaKey {
            slot: slot.map(|ty| ty.id()),
            entries: entries
                .iter()
                .map(|e| (e.discriminator.clone(), e.ty.id()))
                .collect(),
            items: items.as_ref().map(|s| Box::new(s.key.clone())),
        };
        Self {
            slot,
            entries,
            items,
            key,
        }
    }

    /// The slot type the schema was built for; `None` for
    /// [`for_items`](Self::for_items) schemas.
    #[inline]
    pub fn slot(&self) -> Option<&Type> {
        self.slot.as_ref()
    }

    #[inline]
    pub fn entries(&self) -> &[PolymorphicType] {
        &self.entries
    }

    /// Schema for elements, or map values, of a collection-typed slot.
    #[inline]
    pub fn items(&self) -> Option<&Arc<PolymorphismSchema>> {
        self.items.as_ref()
    }

    #[inline]
    pub fn key(&self) -> &SchemaKey {
        &self.key
    }

    pub fn find_by_discriminator(&self, discriminator: &Discriminator) -> Option<&PolymorphicType> {
        self.entries.iter().find(|e| &e.discriminator == discriminator)
    }

    pub fn find_by_type(&self, type_id: TypeId) -> Option<&PolymorphicType> {
        self.entries.iter().find(|e| e.ty.id() == type_id)
    }

    /// Checks that the schema was built for `slot` and that every
    /// discriminator and every concrete type appears once.
    pub fn validate(&self, slot: &Type) -> Result<()> {
        if let Some(own) = &self.slot
            && own != slot
        {
            return Err(MessagePackError::schema(
                slot.name(),
                format!("polymorphism schema was built for {own:?}"),
            ));
        }
        let slot = slot.name();
        if self.entries.is_empty() {
            return Err(MessagePackError::schema(
                slot,
                "polymorphism schema registers no concrete type",
            ));
        }
        for (i, entry) in self.entries.iter().enumerate() {
            for other in &self.entries[..i] {
                if other.discriminator == entry.discriminator {
                    return Err(MessagePackError::schema(
                        slot,
                        format!(
                            "discriminator {} is used by both {:?} and {:?}",
                            entry.discriminator, other.ty, entry.ty
                        ),
                    ));
                }
                if other.ty == entry.ty {
                    return Err(MessagePackError::schema(
                        slot,
                        format!(
                            "{:?} is registered under both {} and {}",
                            entry.ty, other.discriminator, entry.discriminator
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for PolymorphismSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphismSchema")
            .field("slot", &self.slot)
            .field("entries", &self.entries)
            .field("items", &self.items)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// SchemaBuilder

/// Builder returned by [`PolymorphismSchema::builder`].
pub struct SchemaBuilder<A> {
    slot: Type,
    entries: Vec<PolymorphicType>,
    items: Option<Arc<PolymorphismSchema>>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: MessagePackType> SchemaBuilder<A> {
    /// Registers concrete type `C` under `discriminator`.
    pub fn register<C: MessagePackType>(mut self, discriminator: impl Into<Discriminator>) -> Self
    where
        A: PolymorphicSlot<C>,
    {
        self.entries.push(PolymorphicType {
            discriminator: discriminator.into(),
            ty: Type::of::<C>(),
            descriptor: C::type_descriptor,
            into_slot: |concrete| Ok(Box::new(A::from_concrete(unbox::<C>(concrete)?)) as Box<dyn Any>),
        });
        self
    }

    /// Attaches a schema for the elements of collections held in the slot.
    pub fn items(mut self, items: impl Into<Arc<PolymorphismSchema>>) -> Self {
        self.items = Some(items.into());
        self
    }

    pub fn build(self) -> PolymorphismSchema {
        PolymorphismSchema::from_parts(Some(self.slot), self.entries, self.items)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use core::any::Any;

    use super::PolymorphismSchema;
    use crate::error::MessagePackError;
    use crate::info::Type;
    use crate::{impl_message_pack_abstract, impl_message_pack_object};

    trait Animal: Any {}
    impl_message_pack_abstract!(Animal);

    #[derive(Default)]
    struct Cat {
        lives: u8,
    }
    impl Animal for Cat {}
    impl_message_pack_object!(Cat { lives: u8 });

    #[derive(Default)]
    struct Dog {
        good: bool,
    }
    impl Animal for Dog {}
    impl_message_pack_object!(Dog { good: bool });

    #[test]
    fn keys_follow_content() {
        let a = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>(1)
            .register::<Dog>(2)
            .build();
        let b = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>(1)
            .register::<Dog>(2)
            .build();
        let c = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>(1)
            .register::<Dog>("dog")
            .build();
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_ne!(PolymorphismSchema::for_items(a.clone()).key(), a.key());
    }

    trait Plant: Any {}
    impl_message_pack_abstract!(Plant);

    #[test]
    fn validation() {
        let slot = Type::of::<Box<dyn Animal>>();

        let duplicate_tag = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>(1)
            .register::<Dog>(1)
            .build();
        assert!(matches!(
            duplicate_tag.validate(&slot),
            Err(MessagePackError::SchemaViolation { .. })
        ));

        let duplicate_type = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>(1)
            .register::<Cat>(2)
            .build();
        assert!(duplicate_type.validate(&slot).is_err());

        let empty = PolymorphismSchema::builder::<Box<dyn Animal>>().build();
        assert!(empty.validate(&slot).is_err());

        let cats = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>(1)
            .build();
        assert!(cats.validate(&slot).is_ok());
        assert!(matches!(
            cats.validate(&Type::of::<Box<dyn Plant>>()),
            Err(MessagePackError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn into_slot_wraps_concrete_value() {
        let schema = PolymorphismSchema::builder::<Box<dyn Animal>>()
            .register::<Cat>("cat")
            .build();
        let entry = schema.find_by_discriminator(&"cat".into()).unwrap();
        let slot = (entry.into_slot)(Box::new(Cat { lives: 9 })).unwrap();
        let slot = slot.downcast::<Box<dyn Animal>>().unwrap();
        let cat = (&**slot as &dyn Any).downcast_ref::<Cat>().unwrap();
        assert_eq!(cat.lives, 9);
        assert!((entry.into_slot)(Box::new(1_u8)).is_err());
    }
}
