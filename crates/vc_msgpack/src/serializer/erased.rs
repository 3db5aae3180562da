use alloc::boxed::Box;
use core::any::Any;
use core::marker::PhantomData;

use crate::codec::{DynPacker, DynUnpacker};
use crate::error::Result;
use crate::info::{Type, downcast};

// -----------------------------------------------------------------------------
// ErasedSerializer

/// A built serializer for one target type, behind type erasure.
///
/// Values cross the boundary as `&dyn Any` (packing) and `Box<dyn Any>`
/// (unpacking); handing in a value of the wrong type yields a
/// [`TypeMismatch`](crate::MessagePackError::TypeMismatch).
///
/// Built serializers are immutable, so one instance is shared by every
/// thread and every composite that nests the type.
pub trait ErasedSerializer: Send + Sync + 'static {
    /// The type this serializer reads and writes.
    fn target(&self) -> Type;

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()>;

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>>;
}

// -----------------------------------------------------------------------------
// MessagePackSerializer

/// A hand-written serializer for `T`.
///
/// Install one with [`SerializationContext::register`] to take over a type
/// from the builder, or submit it ahead of time with
/// [`submit_prebuilt!`](crate::submit_prebuilt).
///
/// # Examples
///
/// ```
/// use vc_msgpack::codec::{DynPacker, DynUnpacker};
/// use vc_msgpack::context::SerializationContext;
/// use vc_msgpack::serializer::MessagePackSerializer;
///
/// // Writes `bool` as 0 or 1.
/// struct BitBool;
///
/// impl MessagePackSerializer<bool> for BitBool {
///     fn pack_to(&self, packer: &mut DynPacker<'_>, value: &bool) -> vc_msgpack::Result<()> {
///         packer.pack_u8(u8::from(*value))
///     }
///
///     fn unpack_from(&self, unpacker: &mut DynUnpacker<'_>) -> vc_msgpack::Result<bool> {
///         Ok(unpacker.read_int::<u8>()? != 0)
///     }
/// }
///
/// let context = SerializationContext::new();
/// assert!(context.register::<bool, _>(BitBool));
///
/// let serializer = context.get_serializer::<bool>().unwrap();
/// assert_eq!(serializer.pack_single_object(&true).unwrap(), [0x01]);
/// ```
///
/// [`SerializationContext::register`]: crate::context::SerializationContext::register
pub trait MessagePackSerializer<T: 'static>: Send + Sync + 'static {
    fn pack_to(&self, packer: &mut DynPacker<'_>, value: &T) -> Result<()>;

    fn unpack_from(&self, unpacker: &mut DynUnpacker<'_>) -> Result<T>;
}

/// Adapts a [`MessagePackSerializer`] to the erased interface.
pub(crate) struct CustomSerializer<T, S> {
    inner: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> CustomSerializer<T, S> {
    #[inline]
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T: 'static, S: MessagePackSerializer<T>> ErasedSerializer for CustomSerializer<T, S> {
    #[inline]
    fn target(&self) -> Type {
        Type::of::<T>()
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        self.inner.pack_to(packer, downcast::<T>(value)?)
    }

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        Ok(Box::new(self.inner.unpack_from(unpacker)?))
    }
}
