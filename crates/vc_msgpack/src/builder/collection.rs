use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::codec::{DynPacker, DynUnpacker};
use crate::context::DuplicateKeyPolicy;
use crate::error::{MessagePackError, Result};
use crate::info::{CollectionInfo, MapInfo, Type};
use crate::serializer::ErasedSerializer;

// Declared lengths are untrusted; builders never reserve more than this.
const RESERVE_LIMIT: usize = 4096;

// -----------------------------------------------------------------------------
// Collection

pub(crate) struct CollectionSerializer {
    target: Type,
    info: CollectionInfo,
    element: Arc<dyn ErasedSerializer>,
}

impl CollectionSerializer {
    pub(crate) fn new(target: Type, info: CollectionInfo, element: Arc<dyn ErasedSerializer>) -> Self {
        Self {
            target,
            info,
            element,
        }
    }
}

impl ErasedSerializer for CollectionSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        packer.pack_array_header((self.info.len)(value)?)?;
        (self.info.for_each)(value, &mut |item| self.element.pack_erased(packer, item))
    }

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        let len = unpacker.read_array_header()? as usize;
        let mut builder = (self.info.builder)(len.min(RESERVE_LIMIT));
        for _ in 0..len {
            builder.push(self.element.unpack_erased(unpacker)?)?;
        }
        Ok(builder.finish())
    }
}

// -----------------------------------------------------------------------------
// Map

pub(crate) struct MapSerializer {
    target: Type,
    info: MapInfo,
    key: Arc<dyn ErasedSerializer>,
    value: Arc<dyn ErasedSerializer>,
    duplicate_keys: DuplicateKeyPolicy,
}

impl MapSerializer {
    pub(crate) fn new(
        target: Type,
        info: MapInfo,
        key: Arc<dyn ErasedSerializer>,
        value: Arc<dyn ErasedSerializer>,
        duplicate_keys: DuplicateKeyPolicy,
    ) -> Self {
        Self {
            target,
            info,
            key,
            value,
            duplicate_keys,
        }
    }
}

impl ErasedSerializer for MapSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        packer.pack_map_header((self.info.len)(value)?)?;
        (self.info.for_each)(value, &mut |k, v| {
            self.key.pack_erased(packer, k)?;
            self.value.pack_erased(packer, v)
        })
    }

    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        let len = unpacker.read_map_header()? as usize;
        let mut builder = (self.info.builder)(len.min(RESERVE_LIMIT));
        for index in 0..len {
            let key = self.key.unpack_erased(unpacker)?;
            let value = self.value.unpack_erased(unpacker)?;
            let fresh = builder.insert(key, value)?;
            if !fresh && self.duplicate_keys == DuplicateKeyPolicy::Reject {
                return Err(MessagePackError::DuplicateKey {
                    type_name: self.target.name(),
                    index,
                });
            }
        }
        Ok(builder.finish())
    }
}
