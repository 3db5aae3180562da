// -----------------------------------------------------------------------------
// Composite

/// Implements [`MessagePackType`] for a struct with named members.
///
/// Every listed member is serialized. A member may carry:
///
/// - `= N`: its position in the array layout. Either every serialized member
///   has one or none does; without orders, members are laid out by name.
/// - `#[skip]`: excluded from serialization, left at its default when unpacking.
/// - `#[schema(expr)]`: the [`PolymorphismSchema`] for a trait-object member,
///   or for the elements of a collection of them.
/// - `#[duplicate_keys(Reject)]` or `#[duplicate_keys(Overwrite)]`: the
///   [`DuplicateKeyPolicy`] of a map member, in place of the context's.
///
/// The struct must implement [`Default`], which unpacking starts from.
///
/// # Examples
///
/// ```
/// use vc_msgpack::context::SerializationContext;
/// use vc_msgpack::impl_message_pack_object;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
///     label: String,
/// }
///
/// impl_message_pack_object!(Point {
///     x: i32 = 0,
///     y: i32 = 2,
///     #[skip]
///     label: String,
/// });
///
/// let context = SerializationContext::new();
/// let serializer = context.get_serializer::<Point>().unwrap();
///
/// // Position 1 is a gap, written as nil.
/// let bytes = serializer.pack_single_object(&Point { x: 1, y: 2, label: "p".into() }).unwrap();
/// assert_eq!(bytes, [0x93, 0x01, 0xc0, 0x02]);
/// ```
///
/// [`MessagePackType`]: crate::info::MessagePackType
/// [`PolymorphismSchema`]: crate::polymorphism::PolymorphismSchema
/// [`DuplicateKeyPolicy`]: crate::context::DuplicateKeyPolicy
#[macro_export]
macro_rules! impl_message_pack_object {
    ($owner:ident { $($body:tt)* }) => {
        impl $crate::info::MessagePackType for $owner {
            fn type_descriptor() -> $crate::info::TypeDescriptor {
                $crate::info::TypeDescriptor::composite::<Self>(
                    $crate::__pack_members!(@$owner; []; $($body)*)
                )
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __pack_members {
    (@$owner:ident; [$($done:expr,)*];) => {
        $crate::__macro_exports::vec![$($done),*]
    };
    (@$owner:ident; [$($done:expr,)*];
        #[skip] $field:ident : $fty:ty $(= $order:literal)? $(, $($rest:tt)*)?
    ) => {
        $crate::__pack_members!(@$owner; [
            $($done,)*
            $crate::info::MemberInfo::skipped(::core::stringify!($field)),
        ]; $($($rest)*)?)
    };
    (@$owner:ident; [$($done:expr,)*];
        $(#[$attr:ident $args:tt])* $field:ident : $fty:ty $(= $order:literal)? $(, $($rest:tt)*)?
    ) => {
        $crate::__pack_members!(@$owner; [
            $($done,)*
            $crate::__pack_member_attrs!(
                $crate::__pack_member!($owner, $field: $fty $(= $order)?);
                $($attr $args)*
            ),
        ]; $($($rest)*)?)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __pack_member_attrs {
    ($member:expr;) => {
        $member
    };
    ($member:expr; schema($schema:expr) $($rest:tt)*) => {
        $crate::__pack_member_attrs!($member.with_schema($schema); $($rest)*)
    };
    ($member:expr; duplicate_keys($policy:ident) $($rest:tt)*) => {
        $crate::__pack_member_attrs!(
            $member.with_duplicate_keys($crate::context::DuplicateKeyPolicy::$policy);
            $($rest)*
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __pack_member {
    ($owner:ident, $field:ident : $fty:ty $(= $order:literal)?) => {
        $crate::info::MemberInfo::new::<$fty>(
            ::core::stringify!($field),
            |owner| {
                let owner = $crate::info::downcast::<$owner>(owner)?;
                ::core::result::Result::Ok(&owner.$field as &dyn ::core::any::Any)
            },
            |owner, value| {
                $crate::info::downcast_mut::<$owner>(owner)?.$field = $crate::info::unbox::<$fty>(value)?;
                ::core::result::Result::Ok(())
            },
        )
        $(.with_order($order))?
    };
}

// -----------------------------------------------------------------------------
// Enum

/// Implements [`MessagePackType`] for a field-less enum.
///
/// The enum must be `Copy`; its discriminants are the underlying values.
///
/// # Examples
///
/// ```
/// use vc_msgpack::context::{EnumSerializationMethod, SerializationContext, SerializationOptions};
/// use vc_msgpack::impl_message_pack_enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color {
///     Red = 1,
///     Blue = 4,
/// }
///
/// impl_message_pack_enum!(Color { Red, Blue });
///
/// let by_name = SerializationContext::new().get_serializer::<Color>().unwrap();
/// assert_eq!(by_name.pack_single_object(&Color::Red).unwrap(), [0xa3, b'R', b'e', b'd']);
///
/// let by_value = SerializationContext::with_options(
///     SerializationOptions::default().with_enum_method(EnumSerializationMethod::ByUnderlyingValue),
/// );
/// let serializer = by_value.get_serializer::<Color>().unwrap();
/// assert_eq!(serializer.pack_single_object(&Color::Blue).unwrap(), [0x04]);
/// ```
///
/// [`MessagePackType`]: crate::info::MessagePackType
#[macro_export]
macro_rules! impl_message_pack_enum {
    ($owner:ident { $($variant:ident),* $(,)? }) => {
        impl $crate::info::MessagePackType for $owner {
            fn type_descriptor() -> $crate::info::TypeDescriptor {
                $crate::info::TypeDescriptor::of::<Self>($crate::info::TypeKind::Enum(
                    $crate::info::EnumInfo::new(
                        $crate::__macro_exports::vec![$(
                            $crate::info::EnumVariant::new(::core::stringify!($variant), $owner::$variant as i64)
                        ),*],
                        |value| ::core::result::Result::Ok(*$crate::info::downcast::<$owner>(value)? as i64),
                        |raw| match raw {
                            $(raw if raw == $owner::$variant as i64 => ::core::option::Option::Some(
                                $crate::__macro_exports::Box::new($owner::$variant)
                                    as $crate::__macro_exports::Box<dyn ::core::any::Any>,
                            ),)*
                            _ => ::core::option::Option::None,
                        },
                    ),
                ))
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Abstract

/// Implements [`MessagePackType`] for `Box<dyn Trait>`, and
/// [`PolymorphicSlot`] for every implementor of `Trait`.
///
/// `Trait` must have [`Any`](core::any::Any) as a supertrait. A slot is only
/// serializable together with a [`PolymorphismSchema`].
///
/// [`MessagePackType`]: crate::info::MessagePackType
/// [`PolymorphicSlot`]: crate::polymorphism::PolymorphicSlot
/// [`PolymorphismSchema`]: crate::polymorphism::PolymorphismSchema
#[macro_export]
macro_rules! impl_message_pack_abstract {
    ($trait_:ident) => {
        impl $crate::info::MessagePackType for $crate::__macro_exports::Box<dyn $trait_> {
            fn type_descriptor() -> $crate::info::TypeDescriptor {
                $crate::info::TypeDescriptor::of::<Self>($crate::info::TypeKind::Abstract(
                    $crate::info::AbstractInfo::new(|slot| {
                        let slot = $crate::info::downcast::<$crate::__macro_exports::Box<dyn $trait_>>(slot)?;
                        let concrete: &dyn $trait_ = &**slot;
                        ::core::result::Result::Ok(concrete as &dyn ::core::any::Any)
                    }),
                ))
            }
        }

        impl<C: $trait_> $crate::polymorphism::PolymorphicSlot<C> for $crate::__macro_exports::Box<dyn $trait_> {
            #[inline]
            fn from_concrete(concrete: C) -> Self {
                $crate::__macro_exports::Box::new(concrete)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Prebuilt

/// Submits a hand-written serializer for `$ty`, built by `$build`.
///
/// `$build` is a `fn(&SerializationOptions) -> S` where `S` is a
/// [`MessagePackSerializer<$ty>`]. Every context then uses it instead of
/// building one from the type's descriptor. Without the `auto_register`
/// feature this expands to nothing.
///
/// [`MessagePackSerializer<$ty>`]: crate::serializer::MessagePackSerializer
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_prebuilt {
    ($ty:ty, $build:path) => {
        $crate::__macro_exports::auto_register::inventory::submit! {
            $crate::__macro_exports::auto_register::PrebuiltSerializer::new(
                ::core::any::TypeId::of::<$ty>,
                |options| $crate::__macro_exports::auto_register::erase::<$ty, _>($build(options)),
            )
        }
    };
}

/// Submits a hand-written serializer for `$ty`, built by `$build`.
///
/// The `auto_register` feature is disabled, so this expands to nothing.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! submit_prebuilt {
    ($ty:ty, $build:path) => {};
}
