//! Built serializers and the typed handle users hold.
//!
//! - [`Serializer`]: typed, cloneable entry point for pack and unpack.
//! - [`ErasedSerializer`]: what the builder produces for every type.
//! - [`MessagePackSerializer`]: implemented by hand-written serializers.

// -----------------------------------------------------------------------------
// Modules

mod erased;
mod handle;

// -----------------------------------------------------------------------------
// Exports

pub use erased::{ErasedSerializer, MessagePackSerializer};
pub use handle::Serializer;

pub(crate) use erased::CustomSerializer;
