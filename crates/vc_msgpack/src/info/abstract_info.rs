use core::any::Any;

use crate::error::Result;

/// A trait-object slot such as `Box<dyn Shape>`.
///
/// The concrete type behind the slot is only known at run time, so the
/// slot can only be serialized together with a
/// [`PolymorphismSchema`](crate::polymorphism::PolymorphismSchema).
#[derive(Clone, Copy)]
pub struct AbstractInfo {
    pub(crate) as_any: fn(&dyn Any) -> Result<&dyn Any>,
}

impl AbstractInfo {
    /// `as_any` borrows the concrete value out of the erased slot.
    #[inline]
    pub const fn new(as_any: fn(&dyn Any) -> Result<&dyn Any>) -> Self {
        Self { as_any }
    }
}
