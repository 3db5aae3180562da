use core::any::TypeId;
use core::fmt::{self, Debug};

use crate::hash::NoOpHashState;
use crate::hash::hash_map::Entry;
use crate::hash::hashbrown::HashMap;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`].
///
/// `TypeId` already hashes itself as one well-mixed `u64`, so the map uses
/// [`NoOpHashState`] instead of hashing the key a second time.
///
/// # Examples
///
/// ```
/// use vc_utils::TypeIdMap;
///
/// let mut map = TypeIdMap::new();
/// assert!(map.try_insert_type::<u32>(|| "u32"));
/// assert!(!map.try_insert_type::<u32>(|| "ignored"));
///
/// assert_eq!(map.get_type::<u32>(), Some(&"u32"));
/// assert_eq!(map.get_type::<i32>(), None);
/// ```
pub struct TypeIdMap<V>(HashMap<TypeId, V, NoOpHashState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty `TypeIdMap`.
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(NoOpHashState))
    }

    /// Inserts the value produced by `f` unless the key is already present.
    ///
    /// Returns `true` if the value was inserted. `f` only runs on insertion,
    /// so the first registration for a type wins.
    #[inline]
    pub fn try_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Typed shorthand for [`try_insert`](Self::try_insert).
    #[inline(always)]
    pub fn try_insert_type<T: ?Sized + 'static>(&mut self, f: impl FnOnce() -> V) -> bool {
        self.try_insert(TypeId::of::<T>(), f)
    }

    /// Inserts a value, returning the one it replaced.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId, v: V) -> Option<V> {
        self.0.insert(type_id, v)
    }

    /// Returns a reference to the value stored for `type_id`.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// Typed shorthand for [`get`](Self::get).
    #[inline(always)]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    /// Removes the value stored for `type_id`.
    #[inline]
    pub fn remove(&mut self, type_id: &TypeId) -> Option<V> {
        self.0.remove(type_id)
    }

    /// Returns `true` if a value is stored for `type_id`.
    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains_key(type_id)
    }

    /// Returns the number of stored types.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no type is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Traits

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Debug> Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::TypeIdMap;

    #[test]
    fn insert_replaces_and_remove_clears() {
        let mut map = TypeIdMap::new();
        assert_eq!(map.insert(TypeId::of::<u8>(), 1), None);
        assert_eq!(map.insert(TypeId::of::<u8>(), 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove(&TypeId::of::<u8>()), Some(2));
        assert!(map.is_empty());
        assert!(!map.contains(&TypeId::of::<u8>()));
    }
}
