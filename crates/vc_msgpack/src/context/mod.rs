//! Serialization contexts: options plus the serializer cache.
//!
//! ## Menu
//!
//! - [`SerializationContext`]: hands out [`Serializer`]s and caches them per type.
//! - [`SerializationOptions`]: everything a context lets callers choose:
//!     - [`SerializationMethod`]: composites as arrays or maps.
//!     - [`EnumSerializationMethod`]: enums by name or by value.
//!     - [`DateTimeConversionMethod`]: `SystemTime` as timestamp extension or epoch millis.
//!     - [`ArrayMemberCountPolicy`]: strictness of array-shaped composites.
//!     - [`DuplicateKeyPolicy`]: what typed maps do with repeated keys.
//!
//! ## Lifecycle
//!
//! A context is configurable until its first serializer is built or handed
//! out; from then on its options are frozen and
//! [`configure`](SerializationContext::configure) fails with
//! [`ConfigurationFrozen`](crate::MessagePackError::ConfigurationFrozen).
//!
//! A process-wide default is available through
//! [`SerializationContext::global`].
//!
//! ## auto_register
//!
//! With the `auto_register` feature (on by default), serializers submitted
//! with [`submit_prebuilt!`](crate::submit_prebuilt) are used in place of the
//! builder for schema-less types. We use the [`inventory`] crate to collect
//! them; on platforms it does not support, the builder simply runs instead.
//!
//! [`Serializer`]: crate::serializer::Serializer

// -----------------------------------------------------------------------------
// Modules

mod context;
mod options;
mod registry;

#[cfg(feature = "auto_register")]
mod prebuilt;

// -----------------------------------------------------------------------------
// Exports

pub use context::SerializationContext;
pub use options::{ArrayMemberCountPolicy, DuplicateKeyPolicy, SerializationOptions};
pub use options::{DateTimeConversionMethod, EnumSerializationMethod, SerializationMethod};

#[cfg(feature = "auto_register")]
pub use prebuilt::PrebuiltSerializer;

#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub use prebuilt::erase;

pub(crate) use context::ContextShared;
