//! The dynamic value model for data whose static type is unknown.
//!
//! - [`Value`]: a closed tagged union over every MessagePack family.
//! - [`Integer`]: width-independent integer representation.
//! - [`Timestamp`]: the timestamp extension (type `-1`).
//! - [`ExtensionValue`]: any other extension.

// -----------------------------------------------------------------------------
// Modules

mod integer;
mod kind;
mod timestamp;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use integer::IntRepr;

pub use integer::Integer;
pub use kind::ValueKind;
pub use timestamp::Timestamp;
pub use value::{ExtensionValue, Value};
