use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::any::TypeId;
use core::hash::{BuildHasher, Hash};
use std::collections::{HashMap, HashSet};

use vc_utils::collections::Stack;
use vc_utils::hash::hashbrown;

use crate::info::{CollectionInfo, CollectionKind, IndirectInfo, MapInfo, MessagePackType};
use crate::info::{NullableInfo, TypeDescriptor, TypeKind};

// -----------------------------------------------------------------------------
// Wrappers

impl<T: MessagePackType> MessagePackType for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Nullable(NullableInfo::of_option::<T>()))
    }
}

impl<T: MessagePackType> MessagePackType for Box<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Indirect(IndirectInfo::of_box::<T>()))
    }
}

// -----------------------------------------------------------------------------
// Collections

/// `Vec<u8>` is binary; every other element type is an array.
impl<T: MessagePackType> MessagePackType for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            return TypeDescriptor::primitive::<Vec<u8>>();
        }
        let info = CollectionInfo::of::<Self, T>(CollectionKind::Sequence);
        TypeDescriptor::of::<Self>(TypeKind::Collection(info))
    }
}

impl<T: MessagePackType> MessagePackType for VecDeque<T> {
    fn type_descriptor() -> TypeDescriptor {
        let info = CollectionInfo::of::<Self, T>(CollectionKind::Queue);
        TypeDescriptor::of::<Self>(TypeKind::Collection(info))
    }
}

impl<T: MessagePackType> MessagePackType for Stack<T> {
    fn type_descriptor() -> TypeDescriptor {
        let info = CollectionInfo::of::<Self, T>(CollectionKind::Stack);
        TypeDescriptor::of::<Self>(TypeKind::Collection(info))
    }
}

impl<T, S> MessagePackType for HashSet<T, S>
where
    T: MessagePackType + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    fn type_descriptor() -> TypeDescriptor {
        let info = CollectionInfo::of::<Self, T>(CollectionKind::Set);
        TypeDescriptor::of::<Self>(TypeKind::Collection(info))
    }
}

impl<T: MessagePackType + Ord> MessagePackType for BTreeSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        let info = CollectionInfo::of::<Self, T>(CollectionKind::Set);
        TypeDescriptor::of::<Self>(TypeKind::Collection(info))
    }
}

// -----------------------------------------------------------------------------
// Maps

impl<K, V, S> MessagePackType for HashMap<K, V, S>
where
    K: MessagePackType + Eq + Hash,
    V: MessagePackType,
    S: BuildHasher + Default + 'static,
{
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Map(MapInfo::of::<Self, K, V>()))
    }
}

impl<K, V, S> MessagePackType for hashbrown::HashMap<K, V, S>
where
    K: MessagePackType + Eq + Hash,
    V: MessagePackType,
    S: BuildHasher + Default + 'static,
{
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Map(MapInfo::of::<Self, K, V>()))
    }
}

impl<K: MessagePackType + Ord, V: MessagePackType> MessagePackType for BTreeMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Map(MapInfo::of::<Self, K, V>()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec::Vec;

    use vc_utils::hash::HashMap;

    use crate::context::SerializationContext;
    use crate::info::{DescriptorKind, MessagePackType};

    #[test]
    fn descriptor_kinds() {
        assert_eq!(<Option<u8>>::type_descriptor().kind(), DescriptorKind::Nullable);
        assert_eq!(<Box<u8>>::type_descriptor().kind(), DescriptorKind::Indirect);
        assert_eq!(<Vec<u8>>::type_descriptor().kind(), DescriptorKind::Primitive);
        assert_eq!(<Vec<i8>>::type_descriptor().kind(), DescriptorKind::Collection);
        assert_eq!(<HashMap<String, u8>>::type_descriptor().kind(), DescriptorKind::Map);
    }

    #[test]
    fn fixed_hash_map() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<HashMap<String, u8>>().unwrap();
        let mut map = HashMap::default();
        map.insert(String::from("k"), 5);
        let bytes = serializer.pack_single_object(&map).unwrap();
        assert_eq!(bytes, [0x81, 0xa1, b'k', 0x05]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), map);
    }
}
