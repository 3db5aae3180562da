use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use crate::context::DuplicateKeyPolicy;
use crate::error::Result;
use crate::info::{MessagePackType, TypeDescriptor};
use crate::polymorphism::PolymorphismSchema;

// -----------------------------------------------------------------------------
// MemberInfo

#[derive(Clone, Copy)]
pub(crate) struct MemberAccess {
    pub(crate) descriptor: fn() -> TypeDescriptor,
    pub(crate) get: fn(&dyn Any) -> Result<&dyn Any>,
    pub(crate) set: fn(&mut dyn Any, Box<dyn Any>) -> Result<()>,
}

/// One named member of a composite type.
///
/// A member either carries accessors and takes part in serialization, or is
/// [skipped](Self::skipped) and left at its default when unpacking.
///
/// # Examples
///
/// ```
/// use vc_msgpack::info::MemberInfo;
///
/// let skipped = MemberInfo::skipped("cache");
/// assert!(!skipped.is_serializable());
/// assert_eq!(skipped.order(), None);
/// ```
#[derive(Clone)]
pub struct MemberInfo {
    pub(crate) name: &'static str,
    pub(crate) order: Option<u32>,
    pub(crate) access: Option<MemberAccess>,
    pub(crate) schema: Option<Arc<PolymorphismSchema>>,
    pub(crate) duplicate_keys: Option<DuplicateKeyPolicy>,
}

impl MemberInfo {
    /// A serializable member of type `T`.
    ///
    /// `get` borrows the member out of the erased owner; `set` moves an
    /// unpacked value into it.
    pub fn new<T: MessagePackType>(
        name: &'static str,
        get: fn(&dyn Any) -> Result<&dyn Any>,
        set: fn(&mut dyn Any, Box<dyn Any>) -> Result<()>,
    ) -> Self {
        Self {
            name,
            order: None,
            access: Some(MemberAccess {
                descriptor: T::type_descriptor,
                get,
                set,
            }),
            schema: None,
            duplicate_keys: None,
        }
    }

    /// A member excluded from serialization.
    pub const fn skipped(name: &'static str) -> Self {
        Self {
            name,
            order: None,
            access: None,
            schema: None,
            duplicate_keys: None,
        }
    }

    /// Fixes the member's position in the array layout.
    #[inline]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// Attaches a polymorphism schema for a trait-object member, or for the
    /// elements of a collection of them.
    #[inline]
    pub fn with_schema(mut self, schema: impl Into<Arc<PolymorphismSchema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Overrides the duplicate-key policy of a map member, or of the map
    /// behind an `Option` or a pointer.
    #[inline]
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = Some(policy);
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn order(&self) -> Option<u32> {
        self.order
    }

    #[inline]
    pub fn duplicate_keys(&self) -> Option<DuplicateKeyPolicy> {
        self.duplicate_keys
    }

    #[inline]
    pub fn is_serializable(&self) -> bool {
        self.access.is_some()
    }

    #[inline]
    pub fn schema(&self) -> Option<&Arc<PolymorphismSchema>> {
        self.schema.as_ref()
    }

    /// Descriptor of the member's type; `None` for skipped members.
    pub fn descriptor(&self) -> Option<TypeDescriptor> {
        self.access.map(|access| (access.descriptor)())
    }
}

// -----------------------------------------------------------------------------
// CompositeInfo

/// A type made of named members.
#[derive(Clone)]
pub struct CompositeInfo {
    pub(crate) members: Vec<MemberInfo>,
    pub(crate) new_default: fn() -> Box<dyn Any>,
}

impl CompositeInfo {
    pub fn new(members: Vec<MemberInfo>, new_default: fn() -> Box<dyn Any>) -> Self {
        Self {
            members,
            new_default,
        }
    }

    /// Members in declaration order, skipped ones included.
    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name == name)
    }
}
