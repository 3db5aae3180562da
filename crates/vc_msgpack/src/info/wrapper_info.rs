use alloc::boxed::Box;
use core::any::Any;

use crate::error::{MessagePackError, Result};
use crate::info::{MessagePackType, TypeDescriptor, downcast, unbox};

// -----------------------------------------------------------------------------
// NullableInfo

/// `Option<T>`: nil on the wire for `None`, otherwise `T` itself.
#[derive(Clone, Copy)]
pub struct NullableInfo {
    pub(crate) inner: fn() -> TypeDescriptor,
    pub(crate) get: fn(&dyn Any) -> Result<Option<&dyn Any>>,
    pub(crate) none: fn() -> Box<dyn Any>,
    pub(crate) some: fn(Box<dyn Any>) -> Result<Box<dyn Any>>,
}

impl NullableInfo {
    pub fn of_option<T: MessagePackType>() -> Self {
        Self {
            inner: T::type_descriptor,
            get: |value| Ok(downcast::<Option<T>>(value)?.as_ref().map(|v| v as &dyn Any)),
            none: || Box::new(None::<T>) as Box<dyn Any>,
            some: |value| Ok(Box::new(Some(unbox::<T>(value)?)) as Box<dyn Any>),
        }
    }
}

// -----------------------------------------------------------------------------
// IndirectInfo

/// `Box<T>`: a heap indirection with no trace on the wire.
///
/// Needed for recursive types, whose recursion must go through a box.
#[derive(Clone, Copy)]
pub struct IndirectInfo {
    pub(crate) inner: fn() -> TypeDescriptor,
    pub(crate) get: fn(&dyn Any) -> Result<&dyn Any>,
    pub(crate) wrap: fn(Box<dyn Any>) -> Result<Box<dyn Any>>,
}

impl IndirectInfo {
    pub fn of_box<T: MessagePackType>() -> Self {
        Self {
            inner: T::type_descriptor,
            get: |value| Ok(&**downcast::<Box<T>>(value)? as &dyn Any),
            wrap: |value| {
                let inner: Box<T> = value.downcast::<T>().map_err(|_| {
                    MessagePackError::mismatch("erased value", core::any::type_name::<T>())
                })?;
                Ok(Box::new(inner) as Box<dyn Any>)
            },
        }
    }
}
