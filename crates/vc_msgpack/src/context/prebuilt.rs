use alloc::sync::Arc;
use core::any::TypeId;
use std::sync::OnceLock;

use vc_utils::TypeIdMap;

use crate::context::SerializationOptions;
use crate::serializer::{CustomSerializer, ErasedSerializer, MessagePackSerializer};

type BuildFn = fn(&SerializationOptions) -> Arc<dyn ErasedSerializer>;

/// A serializer submitted ahead of time with [`submit_prebuilt!`].
///
/// On a cache miss for a schema-less type, the registry uses the prebuilt
/// serializer instead of running the builder. Output must not depend on
/// whether one is present.
///
/// [`submit_prebuilt!`]: crate::submit_prebuilt
pub struct PrebuiltSerializer {
    type_id: fn() -> TypeId,
    build: BuildFn,
}

impl PrebuiltSerializer {
    #[inline]
    pub const fn new(type_id: fn() -> TypeId, build: BuildFn) -> Self {
        Self { type_id, build }
    }
}

inventory::collect!(PrebuiltSerializer);

/// Erases a hand-written serializer, for use by [`submit_prebuilt!`].
///
/// [`submit_prebuilt!`]: crate::submit_prebuilt
#[inline]
pub fn erase<T: 'static, S: MessagePackSerializer<T>>(serializer: S) -> Arc<dyn ErasedSerializer> {
    Arc::new(CustomSerializer::<T, S>::new(serializer))
}

/// Every submitted serializer, first submission per type wins.
pub(crate) fn lookup(type_id: TypeId) -> Option<BuildFn> {
    static TABLE: OnceLock<TypeIdMap<BuildFn>> = OnceLock::new();

    TABLE
        .get_or_init(|| {
            let mut table = TypeIdMap::new();
            for prebuilt in inventory::iter::<PrebuiltSerializer> {
                table.try_insert((prebuilt.type_id)(), || prebuilt.build);
            }
            table
        })
        .get(&type_id)
        .copied()
}
