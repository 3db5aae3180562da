//! Per-type metadata consumed by the serializer builder.
//!
//! ## Menu
//!
//! - [`MessagePackType`]: the trait a serializable type implements to describe itself.
//! - [`TypeDescriptor`]: the description, a [`Type`] plus one [`TypeKind`]:
//!     - [`PrimitiveInfo`]: written directly by the codec, see [`PackPrimitive`].
//!     - [`NullableInfo`]: `Option<T>`, nil for `None`.
//!     - [`IndirectInfo`]: `Box<T>`, transparent on the wire.
//!     - [`CollectionInfo`]: sequences, queues, stacks and sets, see [`CollectionBuilder`].
//!     - [`MapInfo`]: associative containers, see [`MapBuilder`].
//!     - [`EnumInfo`]: field-less enums.
//!     - [`CompositeInfo`]: named members, see [`MemberInfo`].
//!     - [`AbstractInfo`]: trait-object slots resolved by a polymorphism schema.
//!
//! Values cross the type-erased boundary as `&dyn Any` when packing and as
//! `Box<dyn Any>` when unpacking. [`downcast`], [`downcast_mut`] and [`unbox`]
//! turn a wrong type into a [`TypeMismatch`] instead of a panic.
//!
//! [`TypeMismatch`]: crate::MessagePackError::TypeMismatch

// -----------------------------------------------------------------------------
// Modules

mod abstract_info;
mod collection_info;
mod composite_info;
mod descriptor;
mod enum_info;
mod map_info;
mod primitive_info;
mod wrapper_info;

// -----------------------------------------------------------------------------
// Exports

pub use abstract_info::AbstractInfo;
pub use collection_info::{CollectionBuilder, CollectionInfo, CollectionKind};
pub use composite_info::{CompositeInfo, MemberInfo};
pub use descriptor::{DescriptorKind, DescriptorKindError, Type, TypeDescriptor, TypeKind};
pub use enum_info::{EnumInfo, EnumVariant};
pub use map_info::{MapBuilder, MapInfo, MapStorage};
pub use primitive_info::{PackPrimitive, PrimitiveInfo};
pub use wrapper_info::{IndirectInfo, NullableInfo};

pub(crate) use composite_info::MemberAccess;

use alloc::boxed::Box;
use core::any::Any;

use crate::error::{MessagePackError, Result};

// -----------------------------------------------------------------------------
// MessagePackType

/// A type that can describe its own serialized shape.
///
/// Implementations are usually generated:
///
/// - [`impl_message_pack_object!`] for structs with named members,
/// - [`impl_message_pack_enum!`] for field-less enums,
/// - [`impl_message_pack_abstract!`] for `Box<dyn Trait>` slots.
///
/// Primitives, `Option`, `Box` and the standard collections are covered by
/// the crate.
///
/// [`impl_message_pack_object!`]: crate::impl_message_pack_object
/// [`impl_message_pack_enum!`]: crate::impl_message_pack_enum
/// [`impl_message_pack_abstract!`]: crate::impl_message_pack_abstract
pub trait MessagePackType: 'static {
    /// Returns the description of `Self`.
    fn type_descriptor() -> TypeDescriptor;
}

// -----------------------------------------------------------------------------
// Erased value helpers

/// Borrows an erased value as `T`.
#[inline]
pub fn downcast<T: 'static>(value: &dyn Any) -> Result<&T> {
    value
        .downcast_ref::<T>()
        .ok_or(MessagePackError::mismatch("erased value", core::any::type_name::<T>()))
}

/// Mutably borrows an erased value as `T`.
#[inline]
pub fn downcast_mut<T: 'static>(value: &mut dyn Any) -> Result<&mut T> {
    value
        .downcast_mut::<T>()
        .ok_or(MessagePackError::mismatch("erased value", core::any::type_name::<T>()))
}

/// Takes an erased, owned value back as `T`.
#[inline]
pub fn unbox<T: 'static>(value: Box<dyn Any>) -> Result<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| MessagePackError::mismatch("erased value", core::any::type_name::<T>()))
}
