use core::any::{Any, TypeId};
use core::hash::{Hash, Hasher};
use core::{error, fmt};

use crate::info::{AbstractInfo, CollectionInfo, CompositeInfo, EnumInfo};
use crate::info::{IndirectInfo, MapInfo, NullableInfo, PrimitiveInfo};
use crate::info::{MemberInfo, PackPrimitive};

// -----------------------------------------------------------------------------
// Type

/// Identity of a described type: its [`TypeId`] and a readable name.
///
/// Equality and hashing only look at the `TypeId`.
///
/// # Example
///
/// ```
/// # use core::any::TypeId;
/// # use vc_msgpack::info::Type;
/// let ty = Type::of::<String>();
/// assert_eq!(ty.id(), TypeId::of::<String>());
/// assert!(ty.is::<String>());
/// assert_eq!(ty.name(), "alloc::string::String");
/// ```
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    name: &'static str,
}

impl Type {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The name reported by [`core::any::type_name`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// -----------------------------------------------------------------------------
// DescriptorKind

/// The shape class of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Primitive,
    Nullable,
    Indirect,
    Collection,
    Map,
    Enum,
    Composite,
    Abstract,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive => f.pad("Primitive"),
            Self::Nullable => f.pad("Nullable"),
            Self::Indirect => f.pad("Indirect"),
            Self::Collection => f.pad("Collection"),
            Self::Map => f.pad("Map"),
            Self::Enum => f.pad("Enum"),
            Self::Composite => f.pad("Composite"),
            Self::Abstract => f.pad("Abstract"),
        }
    }
}

/// Error returned when a [`TypeDescriptor`] is not of the expected [`DescriptorKind`].
#[derive(Debug)]
pub struct DescriptorKindError {
    pub expected: DescriptorKind,
    pub received: DescriptorKind,
}

impl fmt::Display for DescriptorKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "descriptor kind mismatch: expected {}, received {}",
            self.expected, self.received
        )
    }
}

impl error::Error for DescriptorKindError {}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Everything a serializer builder needs to know about one type.
#[derive(Clone)]
pub enum TypeKind {
    Primitive(PrimitiveInfo),
    Nullable(NullableInfo),
    Indirect(IndirectInfo),
    Collection(CollectionInfo),
    Map(MapInfo),
    Enum(EnumInfo),
    Composite(CompositeInfo),
    Abstract(AbstractInfo),
}

impl TypeKind {
    pub const fn kind(&self) -> DescriptorKind {
        match self {
            Self::Primitive(_) => DescriptorKind::Primitive,
            Self::Nullable(_) => DescriptorKind::Nullable,
            Self::Indirect(_) => DescriptorKind::Indirect,
            Self::Collection(_) => DescriptorKind::Collection,
            Self::Map(_) => DescriptorKind::Map,
            Self::Enum(_) => DescriptorKind::Enum,
            Self::Composite(_) => DescriptorKind::Composite,
            Self::Abstract(_) => DescriptorKind::Abstract,
        }
    }
}

/// Metadata describing how a type is laid out for serialization.
///
/// A descriptor is plain data: nested types are referenced through
/// `fn() -> TypeDescriptor` pointers, so describing a recursive type never
/// recurses. Descriptors are produced by [`MessagePackType::type_descriptor`],
/// usually through [`impl_message_pack_object!`] and its siblings.
///
/// # Examples
///
/// ```
/// use vc_msgpack::info::{DescriptorKind, MessagePackType};
///
/// let info = <Option<u32> as MessagePackType>::type_descriptor();
///
/// assert_eq!(info.kind(), DescriptorKind::Nullable);
/// assert!(info.ty().is::<Option<u32>>());
/// assert!(info.as_nullable().is_ok());
/// assert!(info.as_composite().is_err());
/// ```
///
/// [`MessagePackType::type_descriptor`]: crate::info::MessagePackType::type_descriptor
/// [`impl_message_pack_object!`]: crate::impl_message_pack_object
#[derive(Clone)]
pub struct TypeDescriptor {
    ty: Type,
    kind: TypeKind,
}

// Helper macro that implements type-safe accessor methods like `as_composite`.
macro_rules! impl_cast_method {
    ($name:ident : $kind:ident => $info:ident) => {
        /// Returns the kind-specific information, or the kind actually held.
        pub const fn $name(&self) -> Result<&$info, DescriptorKindError> {
            match &self.kind {
                TypeKind::$kind(info) => Ok(info),
                _ => Err(DescriptorKindError {
                    expected: DescriptorKind::$kind,
                    received: self.kind.kind(),
                }),
            }
        }
    };
}

impl TypeDescriptor {
    impl_cast_method!(as_primitive: Primitive => PrimitiveInfo);
    impl_cast_method!(as_nullable: Nullable => NullableInfo);
    impl_cast_method!(as_indirect: Indirect => IndirectInfo);
    impl_cast_method!(as_collection: Collection => CollectionInfo);
    impl_cast_method!(as_map: Map => MapInfo);
    impl_cast_method!(as_enum: Enum => EnumInfo);
    impl_cast_method!(as_composite: Composite => CompositeInfo);
    impl_cast_method!(as_abstract: Abstract => AbstractInfo);

    #[inline]
    pub fn new(ty: Type, kind: TypeKind) -> Self {
        Self { ty, kind }
    }

    /// Describes `T` with the given kind information.
    #[inline]
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self::new(Type::of::<T>(), kind)
    }

    /// Describes a type written directly by the codec.
    #[inline]
    pub fn primitive<T: PackPrimitive>() -> Self {
        Self::of::<T>(TypeKind::Primitive(PrimitiveInfo::of::<T>()))
    }

    /// Describes a type made of named members.
    ///
    /// Unpacking starts from `T::default()`, so members missing on the wire
    /// keep their default value.
    pub fn composite<T: Default + 'static>(members: alloc::vec::Vec<MemberInfo>) -> Self {
        Self::of::<T>(TypeKind::Composite(CompositeInfo::new(members, || {
            alloc::boxed::Box::new(T::default()) as alloc::boxed::Box<dyn Any>
        })))
    }

    #[inline(always)]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline(always)]
    pub const fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    #[inline(always)]
    pub const fn type_name(&self) -> &'static str {
        self.ty.name()
    }

    #[inline]
    pub const fn kind(&self) -> DescriptorKind {
        self.kind.kind()
    }

    #[inline]
    pub const fn info(&self) -> &TypeKind {
        &self.kind
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("ty", &self.ty)
            .field("kind", &self.kind())
            .finish()
    }
}
