use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::any::Any;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use std::collections::HashMap;

use vc_utils::hash::hashbrown;

use crate::context::DuplicateKeyPolicy;
use crate::error::Result;
use crate::info::{MessagePackType, TypeDescriptor, downcast, unbox};

// -----------------------------------------------------------------------------
// MapStorage

/// Insertion interface shared by the supported map containers.
pub trait MapStorage<K, V>: 'static {
    fn with_capacity(capacity: usize) -> Self;

    /// Inserts an entry; returns `false` if the key was already present.
    ///
    /// The new value replaces the old one either way.
    fn insert_entry(&mut self, key: K, value: V) -> bool;
}

impl<K, V, S> MapStorage<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash + 'static,
    V: 'static,
    S: BuildHasher + Default + 'static,
{
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, S::default())
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) -> bool {
        self.insert(key, value).is_none()
    }
}

impl<K, V, S> MapStorage<K, V> for hashbrown::HashMap<K, V, S>
where
    K: Eq + Hash + 'static,
    V: 'static,
    S: BuildHasher + Default + 'static,
{
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        hashbrown::HashMap::with_capacity_and_hasher(capacity, S::default())
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) -> bool {
        self.insert(key, value).is_none()
    }
}

impl<K: Ord + 'static, V: 'static> MapStorage<K, V> for BTreeMap<K, V> {
    #[inline]
    fn with_capacity(_: usize) -> Self {
        BTreeMap::new()
    }

    #[inline]
    fn insert_entry(&mut self, key: K, value: V) -> bool {
        self.insert(key, value).is_none()
    }
}

// -----------------------------------------------------------------------------
// MapBuilder

/// Accumulates unpacked entries and produces the finished map.
pub trait MapBuilder {
    /// Inserts an entry; returns `false` if the key was already present.
    fn insert(&mut self, key: Box<dyn Any>, value: Box<dyn Any>) -> Result<bool>;

    fn finish(self: Box<Self>) -> Box<dyn Any>;
}

struct StorageBuilder<M, K, V> {
    map: M,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<M, K, V> MapBuilder for StorageBuilder<M, K, V>
where
    M: MapStorage<K, V>,
    K: 'static,
    V: 'static,
{
    #[inline]
    fn insert(&mut self, key: Box<dyn Any>, value: Box<dyn Any>) -> Result<bool> {
        Ok(self.map.insert_entry(unbox::<K>(key)?, unbox::<V>(value)?))
    }

    fn finish(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.map)
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// An associative container from `key` values to `value` values.
///
/// A map type may fix its own [`DuplicateKeyPolicy`]; otherwise the
/// context's [`duplicate_keys`](crate::context::SerializationOptions::duplicate_keys)
/// applies.
#[derive(Clone, Copy)]
pub struct MapInfo {
    pub(crate) key: fn() -> TypeDescriptor,
    pub(crate) value: fn() -> TypeDescriptor,
    pub(crate) len: fn(&dyn Any) -> Result<usize>,
    pub(crate) for_each: fn(&dyn Any, &mut dyn FnMut(&dyn Any, &dyn Any) -> Result<()>) -> Result<()>,
    pub(crate) builder: fn(usize) -> Box<dyn MapBuilder>,
    pub(crate) duplicate_keys: Option<DuplicateKeyPolicy>,
}

impl MapInfo {
    pub fn of<M, K, V>() -> Self
    where
        M: MapStorage<K, V>,
        K: MessagePackType,
        V: MessagePackType,
        for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
        for<'a> <&'a M as IntoIterator>::IntoIter: ExactSizeIterator,
    {
        Self {
            key: K::type_descriptor,
            value: V::type_descriptor,
            len: |map| Ok(downcast::<M>(map)?.into_iter().len()),
            for_each: |map, f| {
                downcast::<M>(map)?
                    .into_iter()
                    .try_for_each(|(k, v)| f(k as &dyn Any, v as &dyn Any))
            },
            builder: |capacity| {
                Box::new(StorageBuilder::<M, K, V> {
                    map: M::with_capacity(capacity),
                    _marker: PhantomData,
                }) as Box<dyn MapBuilder>
            },
            duplicate_keys: None,
        }
    }

    #[inline]
    pub const fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = Some(policy);
        self
    }

    #[inline]
    pub const fn duplicate_keys(&self) -> Option<DuplicateKeyPolicy> {
        self.duplicate_keys
    }

    #[inline]
    pub fn key(&self) -> TypeDescriptor {
        (self.key)()
    }

    #[inline]
    pub fn value(&self) -> TypeDescriptor {
        (self.value)()
    }
}
