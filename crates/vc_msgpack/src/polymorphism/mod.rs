//! Serializing trait-object slots such as `Box<dyn Shape>`.
//!
//! A slot's static type says nothing about what it holds, so the wire form
//! carries a [`Discriminator`] chosen from a [`PolymorphismSchema`]:
//!
//! ```text
//! [discriminator, payload]
//! ```
//!
//! Schemas are attached to members with `#[schema(..)]` in
//! [`impl_message_pack_object!`], or passed to
//! [`SerializationContext::get_serializer_with_schema`]. Slot types come
//! from [`impl_message_pack_abstract!`].
//!
//! [`impl_message_pack_object!`]: crate::impl_message_pack_object
//! [`impl_message_pack_abstract!`]: crate::impl_message_pack_abstract
//! [`SerializationContext::get_serializer_with_schema`]: crate::context::SerializationContext::get_serializer_with_schema

// -----------------------------------------------------------------------------
// Modules

mod discriminator;
mod schema;

// -----------------------------------------------------------------------------
// Exports

pub use discriminator::Discriminator;
pub use schema::{PolymorphicSlot, PolymorphicType, PolymorphismSchema, SchemaBuilder, SchemaKey};
