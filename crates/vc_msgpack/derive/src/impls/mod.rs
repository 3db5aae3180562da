//! Code generation for the derives.

// -----------------------------------------------------------------------------
// Modules

mod enums;
mod object;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use enums::impl_enum;
pub(crate) use object::impl_object;
