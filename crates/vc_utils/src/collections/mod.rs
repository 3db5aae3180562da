//! Containers whose element order is part of their serialized form.

// -----------------------------------------------------------------------------
// Modules

mod stack;

// -----------------------------------------------------------------------------
// Exports

pub use stack::Stack;
