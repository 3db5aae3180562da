//! Parses derive input into the data the generators need.

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod enums;
mod object;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use attributes::{FieldAttributes, TypeAttributes, VariantAttributes};

pub(crate) use enums::EnumDerive;
pub(crate) use object::{ObjectDerive, ObjectField};
