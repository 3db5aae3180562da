use alloc::boxed::Box;
use core::any::Any;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::SerializationOptions;
use crate::error::Result;
use crate::info::downcast;

// -----------------------------------------------------------------------------
// PackPrimitive

/// A type the codec reads and writes directly, without member or element structure.
///
/// Implementors receive the options of the context that built the
/// serializer, so a type may change its wire shape with them (for example
/// `SystemTime` follows [`DateTimeConversionMethod`]).
///
/// [`DateTimeConversionMethod`]: crate::context::DateTimeConversionMethod
pub trait PackPrimitive: Sized + 'static {
    fn pack_primitive(&self, packer: &mut DynPacker<'_>, options: &SerializationOptions) -> Result<()>;

    fn unpack_primitive(unpacker: &mut DynUnpacker<'_>, options: &SerializationOptions) -> Result<Self>;
}

// -----------------------------------------------------------------------------
// PrimitiveInfo

/// Function table of a [`PackPrimitive`] type.
#[derive(Clone, Copy)]
pub struct PrimitiveInfo {
    pub(crate) pack: fn(&dyn Any, &mut DynPacker<'_>, &SerializationOptions) -> Result<()>,
    pub(crate) unpack: fn(&mut DynUnpacker<'_>, &SerializationOptions) -> Result<Box<dyn Any>>,
}

impl PrimitiveInfo {
    pub fn of<T: PackPrimitive>() -> Self {
        Self {
            pack: |value, packer, options| downcast::<T>(value)?.pack_primitive(packer, options),
            unpack: |unpacker, options| {
                Ok(Box::new(T::unpack_primitive(unpacker, options)?) as Box<dyn Any>)
            },
        }
    }
}
